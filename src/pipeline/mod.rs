// src/pipeline/mod.rs

//! Task composition: the [`Task`] trait, plan resolution from groups, and
//! the series/parallel orchestrator.

pub mod claims;
pub mod graph;
pub mod orchestrator;
pub mod task;

pub use claims::OutputClaims;
pub use graph::{Plan, TaskRegistry, resolve_plan};
pub use orchestrator::{Orchestrator, run_plan};
pub use task::{FileFailure, PassSummary, Task, TaskContext, TaskFuture, TaskReport};
