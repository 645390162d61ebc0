// src/engine/runtime.rs

use std::fmt;

use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::errors::Result;
use crate::exec::PassExecutor;

use super::core::CoreRuntime;
use super::{CoreCommand, RuntimeEvent, ScheduledPass};

/// Feeds `RuntimeEvent`s into the [`CoreRuntime`] and hands the passes it
/// schedules to a [`PassExecutor`].
///
/// All watch semantics live in the core; this shell only does async IO.
pub struct Runtime<E: PassExecutor> {
    core: CoreRuntime,
    event_rx: mpsc::Receiver<RuntimeEvent>,
    executor: E,
}

impl<E: PassExecutor> fmt::Debug for Runtime<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("core", &self.core)
            .finish_non_exhaustive()
    }
}

impl<E: PassExecutor> Runtime<E> {
    pub fn new(core: CoreRuntime, event_rx: mpsc::Receiver<RuntimeEvent>, executor: E) -> Self {
        Self {
            core,
            event_rx,
            executor,
        }
    }

    /// Main event loop. Returns when the channel closes, on shutdown, or
    /// when the core asks to exit.
    pub async fn run(mut self) -> Result<()> {
        info!("watch runtime started");

        loop {
            let event = match self.event_rx.recv().await {
                Some(e) => e,
                None => {
                    info!("runtime event channel closed; exiting");
                    break;
                }
            };

            debug!(?event, "runtime received event");
            let step = self.core.step(event);

            for command in step.commands {
                self.execute_command(command).await?;
            }

            if !step.keep_running {
                info!("stopping watch runtime");
                break;
            }
        }

        Ok(())
    }

    async fn execute_command(&mut self, command: CoreCommand) -> Result<()> {
        match command {
            CoreCommand::DispatchPass(pass) => self.dispatch(pass).await,
            CoreCommand::RequestExit => {
                debug!("core issued RequestExit command");
                Ok(())
            }
        }
    }

    async fn dispatch(&mut self, pass: ScheduledPass) -> Result<()> {
        debug!(binding = %pass.binding, target = %pass.target, pass_id = pass.pass_id, "dispatching pass");
        self.executor.dispatch(pass).await
    }
}
