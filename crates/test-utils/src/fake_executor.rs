use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use assetpipe::engine::{PassOutcome, RuntimeEvent, ScheduledPass};
use assetpipe::errors::Result;
use assetpipe::exec::PassExecutor;
use tokio::sync::mpsc;

/// A fake executor that:
/// - records every dispatched pass
/// - in auto-complete mode, immediately reports `PassCompleted(Success)`;
///   otherwise the test sends completions itself.
pub struct FakePassExecutor {
    runtime_tx: mpsc::Sender<RuntimeEvent>,
    dispatched: Arc<Mutex<Vec<ScheduledPass>>>,
    auto_complete: bool,
}

impl FakePassExecutor {
    pub fn new(
        runtime_tx: mpsc::Sender<RuntimeEvent>,
        dispatched: Arc<Mutex<Vec<ScheduledPass>>>,
        auto_complete: bool,
    ) -> Self {
        Self {
            runtime_tx,
            dispatched,
            auto_complete,
        }
    }
}

impl PassExecutor for FakePassExecutor {
    fn dispatch(
        &mut self,
        pass: ScheduledPass,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        let tx = self.runtime_tx.clone();
        let dispatched = Arc::clone(&self.dispatched);
        let auto_complete = self.auto_complete;

        Box::pin(async move {
            dispatched.lock().unwrap().push(pass.clone());
            if auto_complete {
                tx.send(RuntimeEvent::PassCompleted {
                    binding: pass.binding,
                    outcome: PassOutcome::Success,
                })
                .await
                .map_err(anyhow::Error::from)?;
            }
            Ok(())
        })
    }
}
