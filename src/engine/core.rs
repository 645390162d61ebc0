// src/engine/core.rs

//! Pure core runtime state machine.
//!
//! This module contains a synchronous, deterministic "core runtime" that
//! consumes [`RuntimeEvent`]s and produces:
//! - an updated per-binding state
//! - a list of "commands" describing what the IO shell should do next
//!
//! The async shell (`engine::runtime::Runtime`) is responsible for reading
//! events from channels, handing passes to the executor and handling
//! shutdown. The core has no Tokio types and performs no IO, so it can be
//! tested exhaustively.

use std::collections::BTreeMap;

use crate::config::ConfigFile;
use crate::engine::event_handlers::{CoreStep, handle_binding_trigger, handle_pass_completion};
use crate::engine::queue::TriggerQueue;
use crate::engine::{BindingName, RuntimeEvent, RuntimeOptions};

/// Whether a binding currently has a pass in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingState {
    Idle,
    Running { pass_id: u64 },
}

/// Static description of one watch binding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindingSpec {
    pub name: BindingName,
    /// Task or group to run.
    pub target: String,
    /// Queue one follow-up for triggers during a pass (else drop them).
    pub queue: bool,
}

#[derive(Debug)]
pub(crate) struct BindingSlot {
    pub(crate) target: String,
    pub(crate) queue: bool,
    pub(crate) state: BindingState,
}

/// Pure core runtime state.
#[derive(Debug)]
pub struct CoreRuntime {
    bindings: BTreeMap<BindingName, BindingSlot>,
    queue: TriggerQueue,
    options: RuntimeOptions,
    next_pass_id: u64,
}

impl CoreRuntime {
    pub fn new<I>(specs: I, options: RuntimeOptions) -> Self
    where
        I: IntoIterator<Item = BindingSpec>,
    {
        let bindings = specs
            .into_iter()
            .map(|spec| {
                (
                    spec.name,
                    BindingSlot {
                        target: spec.target,
                        queue: spec.queue,
                        state: BindingState::Idle,
                    },
                )
            })
            .collect();
        Self {
            bindings,
            queue: TriggerQueue::new(),
            options,
            next_pass_id: 0,
        }
    }

    /// One [`BindingSpec`] per `[watch.*]` binding of `cfg`.
    pub fn from_config(cfg: &ConfigFile, options: RuntimeOptions) -> Self {
        let specs = cfg.bindings().iter().map(|(name, b)| BindingSpec {
            name: name.clone(),
            target: b.run.clone(),
            queue: cfg.binding_queues(b),
        });
        Self::new(specs, options)
    }

    /// True when no binding is running.
    pub fn is_idle(&self) -> bool {
        self.bindings
            .values()
            .all(|slot| slot.state == BindingState::Idle)
    }

    /// Expose queue emptiness (for tests).
    pub fn queue_is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Whether `binding` has a follow-up queued.
    pub fn has_queued(&self, binding: &str) -> bool {
        self.queue.contains(binding)
    }

    pub fn state_of(&self, binding: &str) -> Option<BindingState> {
        self.bindings.get(binding).map(|slot| slot.state)
    }

    /// Number of bindings with a pass in flight.
    pub fn running_count(&self) -> usize {
        self.bindings
            .values()
            .filter(|slot| slot.state != BindingState::Idle)
            .count()
    }

    /// Handle a single runtime event, updating core state and returning the
    /// resulting commands for the IO shell.
    pub fn step(&mut self, event: RuntimeEvent) -> CoreStep {
        match event {
            RuntimeEvent::BindingTriggered { binding, reason } => handle_binding_trigger(
                &mut self.bindings,
                &mut self.queue,
                &mut self.next_pass_id,
                binding,
                reason,
            ),
            RuntimeEvent::PassCompleted { binding, outcome } => handle_pass_completion(
                &mut self.bindings,
                &mut self.queue,
                &self.options,
                &mut self.next_pass_id,
                binding,
                outcome,
            ),
            RuntimeEvent::ShutdownRequested => CoreStep {
                commands: Vec::new(),
                keep_running: false,
            },
        }
    }
}
