// src/engine/event_handlers.rs

//! Event handling logic for the core runtime.

use std::collections::BTreeMap;

use tracing::{debug, warn};

use crate::engine::core::{BindingSlot, BindingState};
use crate::engine::queue::TriggerQueue;
use crate::engine::{BindingName, PassOutcome, RuntimeOptions, ScheduledPass, TriggerReason};

/// Command produced by the pure core, to be executed by the outer IO shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoreCommand {
    /// Run this pass.
    DispatchPass(ScheduledPass),
    /// Request that the process exits (everything idle in exit-when-idle mode).
    RequestExit,
}

/// Decision returned by the core after handling a single `RuntimeEvent`.
#[derive(Debug, Clone)]
pub struct CoreStep {
    /// Commands the IO shell should execute.
    pub commands: Vec<CoreCommand>,
    /// Whether the outer runtime loop should keep running.
    pub keep_running: bool,
}

impl CoreStep {
    fn cont(commands: Vec<CoreCommand>) -> Self {
        Self {
            commands,
            keep_running: true,
        }
    }
}

/// Handle a trigger for `binding`.
///
/// - Idle: start a pass (Idle -> Running).
/// - Running with `queue = true`: remember one follow-up (coalesced).
/// - Running with `queue = false`: drop the trigger.
pub(crate) fn handle_binding_trigger(
    bindings: &mut BTreeMap<BindingName, BindingSlot>,
    queue: &mut TriggerQueue,
    next_pass_id: &mut u64,
    binding: BindingName,
    reason: TriggerReason,
) -> CoreStep {
    let Some(slot) = bindings.get_mut(&binding) else {
        warn!(binding = %binding, "trigger for unknown binding ignored");
        return CoreStep::cont(Vec::new());
    };

    match slot.state {
        BindingState::Idle => {
            debug!(binding = %binding, ?reason, "binding idle; starting pass");
            let pass = start_pass(slot, next_pass_id, binding);
            CoreStep::cont(vec![CoreCommand::DispatchPass(pass)])
        }
        BindingState::Running { pass_id } => {
            if slot.queue {
                queue.record_trigger(&binding);
            } else {
                debug!(
                    binding = %binding,
                    pass_id,
                    "binding running and queue=false; trigger dropped"
                );
            }
            CoreStep::cont(Vec::new())
        }
    }
}

/// Handle the end of a pass: Running -> Idle, then start the queued
/// follow-up if there is one.
pub(crate) fn handle_pass_completion(
    bindings: &mut BTreeMap<BindingName, BindingSlot>,
    queue: &mut TriggerQueue,
    options: &RuntimeOptions,
    next_pass_id: &mut u64,
    binding: BindingName,
    outcome: PassOutcome,
) -> CoreStep {
    let mut commands = Vec::new();

    match bindings.get_mut(&binding) {
        Some(slot) => {
            if slot.state == BindingState::Idle {
                warn!(binding = %binding, "completion for a binding that was not running");
            }
            debug!(binding = %binding, ?outcome, "pass completed");
            slot.state = BindingState::Idle;

            if queue.take(&binding) {
                let pass = start_pass(slot, next_pass_id, binding);
                commands.push(CoreCommand::DispatchPass(pass));
            }
        }
        None => warn!(binding = %binding, "completion for unknown binding ignored"),
    }

    let all_idle = bindings
        .values()
        .all(|slot| slot.state == BindingState::Idle);
    if options.exit_when_idle && all_idle && queue.is_empty() {
        commands.push(CoreCommand::RequestExit);
        return CoreStep {
            commands,
            keep_running: false,
        };
    }

    CoreStep::cont(commands)
}

fn start_pass(slot: &mut BindingSlot, next_pass_id: &mut u64, binding: BindingName) -> ScheduledPass {
    *next_pass_id += 1;
    let pass_id = *next_pass_id;
    slot.state = BindingState::Running { pass_id };
    ScheduledPass {
        binding,
        target: slot.target.clone(),
        pass_id,
    }
}
