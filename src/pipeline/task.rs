// src/pipeline/task.rs

//! The unit of work the orchestrator runs, and what it reports back.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::Arc;

use crate::config::ConfigFile;
use crate::errors::Result;
use crate::pipeline::claims::OutputClaims;
use crate::server::LiveReload;
use crate::types::{BuildMode, ReloadKind, TaskKind};

/// Boxed future returned by [`Task::run`].
pub type TaskFuture<'a> = Pin<Box<dyn Future<Output = Result<TaskReport>> + Send + 'a>>;

/// A named build operation.
///
/// `run` resolves to:
/// - `Ok(report)` when the task completed; individual files may still have
///   failed (`report.failures`), which the pipeline reports and moves past.
/// - `Err(_)` for fatal conditions (unreadable source directory, output
///   conflicts, clean failures) that must halt the enclosing series.
pub trait Task: Send + Sync {
    fn name(&self) -> &str;

    fn kind(&self) -> TaskKind;

    /// Browser signal to send after a run that wrote output.
    fn reload(&self) -> ReloadKind;

    fn run<'a>(&'a self, ctx: &'a TaskContext) -> TaskFuture<'a>;
}

/// Everything a task needs from its surroundings, passed explicitly.
///
/// Cheap to clone; every build pass gets its own [`OutputClaims`].
#[derive(Debug, Clone)]
pub struct TaskContext {
    root: Arc<PathBuf>,
    config: Arc<ConfigFile>,
    mode: BuildMode,
    reload: LiveReload,
    claims: OutputClaims,
}

impl TaskContext {
    pub fn new(
        root: impl Into<PathBuf>,
        config: Arc<ConfigFile>,
        mode: BuildMode,
        reload: LiveReload,
    ) -> Self {
        Self {
            root: Arc::new(root.into()),
            config,
            mode,
            reload,
            claims: OutputClaims::default(),
        }
    }

    /// Same context with a fresh claim registry, for a new build pass.
    pub fn for_pass(&self) -> Self {
        Self {
            claims: OutputClaims::default(),
            ..self.clone()
        }
    }

    /// Project root; all globs and destinations are relative to it.
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config(&self) -> &ConfigFile {
        &self.config
    }

    pub fn mode(&self) -> BuildMode {
        self.mode
    }

    pub fn reload(&self) -> &LiveReload {
        &self.reload
    }

    pub fn claims(&self) -> &OutputClaims {
        &self.claims
    }

    /// Resolve a project-relative path.
    pub fn resolve(&self, rel: impl AsRef<Path>) -> PathBuf {
        self.root.join(rel)
    }
}

/// A single file that could not be transformed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileFailure {
    pub path: PathBuf,
    pub message: String,
}

/// Result of one completed task run.
#[derive(Debug, Clone, Default)]
pub struct TaskReport {
    pub task: String,
    /// Files written (absolute paths).
    pub written: Vec<PathBuf>,
    /// Files that failed; their previous output was left in place.
    pub failures: Vec<FileFailure>,
}

impl TaskReport {
    pub fn new(task: impl Into<String>) -> Self {
        Self {
            task: task.into(),
            ..Self::default()
        }
    }

    pub fn fail(&mut self, path: impl Into<PathBuf>, message: impl Into<String>) {
        self.failures.push(FileFailure {
            path: path.into(),
            message: message.into(),
        });
    }

    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Aggregated reports of one group (or single task) run.
#[derive(Debug, Clone, Default)]
pub struct PassSummary {
    pub reports: Vec<TaskReport>,
}

impl PassSummary {
    pub fn single(report: TaskReport) -> Self {
        Self {
            reports: vec![report],
        }
    }

    pub fn merge(&mut self, other: PassSummary) {
        self.reports.extend(other.reports);
    }

    pub fn failure_count(&self) -> usize {
        self.reports.iter().map(|r| r.failures.len()).sum()
    }

    pub fn written_count(&self) -> usize {
        self.reports.iter().map(|r| r.written.len()).sum()
    }

    pub fn report(&self, task: &str) -> Option<&TaskReport> {
        self.reports.iter().find(|r| r.task == task)
    }

    /// Turn reported file failures into an error (used by one-shot runs).
    pub fn into_result(self) -> Result<Self> {
        match self.failure_count() {
            0 => Ok(self),
            n => Err(crate::errors::PipelineError::TaskFailures(n)),
        }
    }
}
