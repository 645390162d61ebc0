// src/engine/mod.rs

//! Watch-mode engine for assetpipe.
//!
//! This module ties together:
//! - per-binding Idle/Running state (one pass per binding at a time)
//! - the follow-up queue (what happens when triggers arrive mid-pass)
//! - the runtime event loop that reacts to:
//!   - file-watch triggers
//!   - pass completion events
//!   - shutdown signals
//!
//! The pure core state machine lives in [`core`]; the async/IO shell is
//! implemented in [`runtime`].

/// Canonical watch binding name type used throughout the engine.
pub type BindingName = String;

/// How a build pass ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassOutcome {
    /// Completed; may include reported file failures.
    Success,
    /// A fatal task error halted the pass.
    Failed,
}

/// Why a binding was triggered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerReason {
    /// Manual trigger (e.g. tests or an explicit request).
    Manual,
    /// Triggered due to a filesystem event.
    FileWatch,
}

/// Runtime options used by both the core and the async shell.
#[derive(Debug, Clone, Copy, Default)]
pub struct RuntimeOptions {
    /// Exit once every binding is idle and nothing is queued.
    pub exit_when_idle: bool,
}

/// A pass the core wants executed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduledPass {
    pub binding: BindingName,
    /// Task or group to run.
    pub target: String,
    /// Monotonic id across all bindings, for logs.
    pub pass_id: u64,
}

/// Events flowing into the runtime from the watcher and executor.
#[derive(Debug, Clone)]
pub enum RuntimeEvent {
    /// A watch binding saw a relevant change.
    BindingTriggered {
        binding: BindingName,
        reason: TriggerReason,
    },
    /// The pass of a binding finished.
    PassCompleted {
        binding: BindingName,
        outcome: PassOutcome,
    },
    /// Graceful shutdown requested (e.g. Ctrl-C).
    ShutdownRequested,
}

pub mod core;
pub mod event_handlers;
pub mod queue;
pub mod runtime;

pub use core::{BindingSpec, BindingState, CoreRuntime};
pub use event_handlers::{CoreCommand, CoreStep};
pub use queue::TriggerQueue;
pub use runtime::Runtime;
