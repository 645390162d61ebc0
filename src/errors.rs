// src/errors.rs

//! Crate-wide error aliases and helpers.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Task or group not found: {0}")]
    TaskNotFound(String),

    #[error("Cycle detected in task groups: {0}")]
    GroupCycle(String),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Output {path:?} claimed by both '{first}' and '{second}'")]
    OutputConflict {
        path: PathBuf,
        first: String,
        second: String,
    },

    #[error("Lint failed: {errors} error(s) in {files} file(s)")]
    LintFailed { errors: usize, files: usize },

    #[error("{0} file(s) failed to build")]
    TaskFailures(usize),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, PipelineError>;
