// src/exec/backend.rs

//! Pluggable pass executor abstraction.
//!
//! The runtime talks to a `PassExecutor` instead of the orchestrator
//! directly, so tests can swap in a fake that records dispatched passes and
//! emits `PassCompleted` on their own schedule.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use tokio::sync::mpsc;

use crate::engine::{RuntimeEvent, ScheduledPass};
use crate::errors::Result;
use crate::exec::pass_runner::run_pass;
use crate::pipeline::Orchestrator;

/// Trait abstracting how scheduled passes are executed.
pub trait PassExecutor: Send {
    /// Start `pass`. Must not wait for it to finish; completion is
    /// reported back as `RuntimeEvent::PassCompleted`.
    fn dispatch(&mut self, pass: ScheduledPass) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>>;
}

/// Production executor: spawns each pass on the orchestrator.
#[derive(Debug, Clone)]
pub struct PipelineExecutor {
    orchestrator: Arc<Orchestrator>,
    runtime_tx: mpsc::Sender<RuntimeEvent>,
}

impl PipelineExecutor {
    pub fn new(orchestrator: Arc<Orchestrator>, runtime_tx: mpsc::Sender<RuntimeEvent>) -> Self {
        Self {
            orchestrator,
            runtime_tx,
        }
    }
}

impl PassExecutor for PipelineExecutor {
    fn dispatch(&mut self, pass: ScheduledPass) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        let orchestrator = Arc::clone(&self.orchestrator);
        let tx = self.runtime_tx.clone();

        Box::pin(async move {
            tokio::spawn(run_pass(orchestrator, pass, tx));
            Ok(())
        })
    }
}
