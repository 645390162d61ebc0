// src/tasks/per_file.rs

//! Shared driver for tasks that map each matched source file to outputs.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, warn};

use crate::errors::PipelineError;
use crate::fs::{SourceFile, SourceSet, write_output};
use crate::pipeline::{Task, TaskContext, TaskFuture, TaskReport};
use crate::types::{BuildMode, ReloadKind, TaskKind};

/// What a transform sees of the surrounding pass. Owned, so it can move
/// into a blocking worker.
#[derive(Debug, Clone)]
pub struct TransformEnv {
    pub root: PathBuf,
    pub mode: BuildMode,
    pub sourcemaps: bool,
}

impl TransformEnv {
    fn from_ctx(ctx: &TaskContext) -> Self {
        Self {
            root: ctx.root().to_path_buf(),
            mode: ctx.mode(),
            sourcemaps: ctx.config().settings().sourcemaps,
        }
    }

    /// Path relative to the project root, for messages.
    pub fn display_path(&self, path: &Path) -> String {
        crate::fs::to_slash(path.strip_prefix(&self.root).unwrap_or(path))
    }
}

/// Result of transforming one source file.
#[derive(Debug, Default)]
pub struct FileOutput {
    /// Absolute output path and contents.
    pub outputs: Vec<(PathBuf, Vec<u8>)>,
    /// New contents for the source file itself (auto-fix).
    pub rewrite_source: Option<String>,
    /// Non-fatal remarks to log (lint findings).
    pub notes: Vec<String>,
}

impl FileOutput {
    pub fn single(path: PathBuf, contents: impl Into<Vec<u8>>) -> Self {
        Self {
            outputs: vec![(path, contents.into())],
            ..Self::default()
        }
    }
}

/// Synchronous per-file transform, run on the blocking pool.
///
/// `Ok(None)` skips the file (e.g. Sass partials).
pub trait FileTransform: Send + Sync + 'static {
    fn transform(
        &self,
        file: &SourceFile,
        dest: &Path,
        env: &TransformEnv,
    ) -> anyhow::Result<Option<FileOutput>>;
}

/// A [`Task`] that expands `src` and applies a [`FileTransform`] to each file.
pub struct FileTask<T> {
    name: String,
    kind: TaskKind,
    reload: ReloadKind,
    sources: SourceSet,
    dest: PathBuf,
    transform: Arc<T>,
}

impl<T: FileTransform> FileTask<T> {
    pub fn new(
        name: impl Into<String>,
        kind: TaskKind,
        reload: ReloadKind,
        sources: SourceSet,
        dest: impl Into<PathBuf>,
        transform: T,
    ) -> Self {
        Self {
            name: name.into(),
            kind,
            reload,
            sources,
            dest: dest.into(),
            transform: Arc::new(transform),
        }
    }

    async fn run_files(&self, ctx: &TaskContext) -> crate::errors::Result<TaskReport> {
        let files = self
            .sources
            .expand(ctx.root())
            .await
            .map_err(|e| PipelineError::Other(e.context(format!("task '{}'", self.name))))?;
        debug!(task = %self.name, files = files.len(), "sources expanded");

        let env = TransformEnv::from_ctx(ctx);
        let dest = ctx.resolve(&self.dest);
        let mut report = TaskReport::new(&self.name);

        for file in files {
            let transform = Arc::clone(&self.transform);
            let job_env = env.clone();
            let job_file = file.clone();
            let job_dest = dest.clone();
            let joined = tokio::task::spawn_blocking(move || {
                transform.transform(&job_file, &job_dest, &job_env)
            })
            .await;

            let output = match joined {
                Ok(Ok(Some(output))) => output,
                Ok(Ok(None)) => continue,
                Ok(Err(e)) => {
                    report.fail(&file.path, format!("{e:#}"));
                    continue;
                }
                Err(e) => {
                    report.fail(&file.path, format!("transform panicked: {e}"));
                    continue;
                }
            };

            let shown = env.display_path(&file.path);
            for note in &output.notes {
                warn!(task = %self.name, "{shown}:{note}");
            }

            if let Some(fixed) = output.rewrite_source {
                if let Err(e) = write_output(&file.path, fixed).await {
                    report.fail(&file.path, format!("{e:#}"));
                    continue;
                }
                debug!(task = %self.name, path = %shown, "source rewritten");
            }

            for (path, contents) in output.outputs {
                ctx.claims().claim(&path, &self.name)?;
                match write_output(&path, &contents).await {
                    Ok(()) => report.written.push(path),
                    Err(e) => report.fail(&file.path, format!("{e:#}")),
                }
            }
        }

        Ok(report)
    }
}

impl<T: FileTransform> Task for FileTask<T> {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> TaskKind {
        self.kind
    }

    fn reload(&self) -> ReloadKind {
        self.reload
    }

    fn run<'a>(&'a self, ctx: &'a TaskContext) -> TaskFuture<'a> {
        Box::pin(self.run_files(ctx))
    }
}
