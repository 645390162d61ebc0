// src/exec/mod.rs

//! Pass execution layer.
//!
//! - [`backend`] provides the `PassExecutor` trait and the production
//!   `PipelineExecutor`, which tests replace with a fake.
//! - [`pass_runner`] runs one pass through the orchestrator and reports
//!   `PassCompleted` back to the runtime.

pub mod backend;
pub mod pass_runner;

pub use backend::{PassExecutor, PipelineExecutor};
pub use pass_runner::run_pass;
