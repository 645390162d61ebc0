// src/exec/pass_runner.rs

//! Runs one scheduled pass and reports back to the runtime.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{error, info, warn};

use crate::engine::{PassOutcome, RuntimeEvent, ScheduledPass};
use crate::pipeline::Orchestrator;

/// Run `pass` to completion and always send `PassCompleted`, whatever the
/// outcome, so the binding returns to Idle. The pass runs in its own task
/// so a panic inside it counts as a failed pass.
pub async fn run_pass(
    orchestrator: Arc<Orchestrator>,
    pass: ScheduledPass,
    runtime_tx: mpsc::Sender<RuntimeEvent>,
) {
    info!(
        binding = %pass.binding,
        target = %pass.target,
        pass_id = pass.pass_id,
        "change detected; rebuilding"
    );

    let target = pass.target.clone();
    let joined = tokio::spawn(async move { orchestrator.run_named(&target).await }).await;

    let outcome = match joined {
        Ok(Ok(summary)) if summary.failure_count() > 0 => {
            warn!(
                binding = %pass.binding,
                pass_id = pass.pass_id,
                failed = summary.failure_count(),
                "pass finished with failures"
            );
            PassOutcome::Success
        }
        Ok(Ok(_)) => PassOutcome::Success,
        Ok(Err(_)) => PassOutcome::Failed,
        Err(err) => {
            error!(binding = %pass.binding, pass_id = pass.pass_id, "pass aborted: {err}");
            PassOutcome::Failed
        }
    };

    if let Err(err) = runtime_tx
        .send(RuntimeEvent::PassCompleted {
            binding: pass.binding.clone(),
            outcome,
        })
        .await
    {
        warn!(binding = %pass.binding, "runtime gone; dropping completion: {err}");
    }
}
