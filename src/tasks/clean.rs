// src/tasks/clean.rs

use std::path::{Path, PathBuf};

use anyhow::anyhow;
use tracing::info;

use crate::config::ConfigFile;
use crate::errors::{PipelineError, Result};
use crate::fs::{glob_base, lexical_normalize, reset_output_root};
use crate::pipeline::{Task, TaskContext, TaskFuture, TaskReport};
use crate::types::{ReloadKind, TaskKind};

/// Recreate the output root empty.
#[derive(Debug, Clone)]
pub struct CleanTask {
    name: String,
    target: PathBuf,
}

impl CleanTask {
    /// `target` is relative to the project root.
    pub fn new(name: impl Into<String>, target: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            target: target.into(),
        }
    }

    pub fn target(&self) -> &Path {
        &self.target
    }

    async fn clean(&self, ctx: &TaskContext) -> Result<TaskReport> {
        let target = ctx.resolve(&self.target);
        ensure_safe_target(ctx.root(), &target, ctx.config())?;

        reset_output_root(&target).await.map_err(|e| {
            PipelineError::Other(anyhow!("cleaning {:?} failed: {e}", target))
        })?;
        info!(task = %self.name, dir = ?target, "output root reset");
        Ok(TaskReport::new(&self.name))
    }
}

impl Task for CleanTask {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> TaskKind {
        TaskKind::Clean
    }

    fn reload(&self) -> ReloadKind {
        ReloadKind::None
    }

    fn run<'a>(&'a self, ctx: &'a TaskContext) -> TaskFuture<'a> {
        Box::pin(self.clean(ctx))
    }
}

/// Refuse to delete the project root, one of its ancestors, or a directory
/// that holds configured sources.
pub fn ensure_safe_target(root: &Path, target: &Path, cfg: &ConfigFile) -> Result<()> {
    let root = lexical_normalize(root);
    let target = lexical_normalize(target);

    if root.starts_with(&target) {
        return Err(PipelineError::ConfigError(format!(
            "refusing to clean {:?}: it is the project root or contains it",
            target
        )));
    }

    for (name, task) in cfg.tasks() {
        let inputs = task
            .src
            .iter()
            .chain(task.plugins.iter())
            .chain(task.entry.iter());
        for pattern in inputs {
            let base = lexical_normalize(&root.join(glob_base(pattern)));
            if base.starts_with(&target) {
                return Err(PipelineError::ConfigError(format!(
                    "refusing to clean {:?}: it contains sources of task '{name}'",
                    target
                )));
            }
        }
    }
    Ok(())
}
