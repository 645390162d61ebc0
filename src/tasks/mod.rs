// src/tasks/mod.rs

//! Concrete tasks, one module per [`TaskKind`], and the registry builder
//! that turns `[task.*]` sections into runnable [`Task`] objects.

pub mod bundle;
pub mod clean;
pub mod copy;
pub mod css;
pub mod html;
pub mod js;
pub mod lint;
pub mod per_file;
pub mod sass;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::{ConfigFile, TaskConfig};
use crate::errors::{PipelineError, Result};
use crate::fs::SourceSet;
use crate::pipeline::{Task, TaskRegistry};
use crate::types::TaskKind;

pub use bundle::BundleTask;
pub use clean::{CleanTask, ensure_safe_target};
pub use lint::{LintTask, lint_all, lint_tasks, run_lint};
pub use per_file::{FileOutput, FileTask, FileTransform, TransformEnv};

/// Instantiate every non-lint task of `cfg`.
///
/// Lint tasks are not part of the registry; see [`lint_tasks`]. `root` is
/// only needed for lookups that happen outside a pass (partials).
pub fn build_registry(cfg: &ConfigFile, root: &Path) -> Result<TaskRegistry> {
    let mut registry = TaskRegistry::default();
    for (name, task) in cfg.tasks() {
        if task.kind == TaskKind::Lint {
            continue;
        }
        registry.insert(build_task(cfg, root, name, task)?);
    }
    Ok(registry)
}

fn build_task(
    cfg: &ConfigFile,
    root: &Path,
    name: &str,
    task: &TaskConfig,
) -> Result<Arc<dyn Task>> {
    let reload = task.effective_reload();

    if task.kind == TaskKind::Clean {
        let target = task
            .dest
            .clone()
            .unwrap_or_else(|| cfg.settings().dist.clone());
        return Ok(Arc::new(CleanTask::new(name, target)));
    }

    let dest = PathBuf::from(task.dest.as_deref().unwrap_or_default());

    if task.kind == TaskKind::Bundle {
        let entry = task.entry.as_deref().ok_or_else(|| {
            PipelineError::ConfigError(format!("bundle task '{name}' has no `entry`"))
        })?;
        let plugins = if task.plugins.is_empty() {
            None
        } else {
            Some(SourceSet::new(&task.plugins, &[])?)
        };
        let bundle = BundleTask::new(name, reload, entry, dest, task.output.clone(), plugins)?;
        return Ok(Arc::new(bundle));
    }

    let sources = SourceSet::new(&task.src, &task.exclude)?;
    let built: Arc<dyn Task> = match task.kind {
        TaskKind::Css => Arc::new(FileTask::new(
            name,
            task.kind,
            reload,
            sources,
            dest,
            css::MinifyCss,
        )),
        TaskKind::Js => Arc::new(FileTask::new(
            name,
            task.kind,
            reload,
            sources,
            dest,
            js::LintAndCopy { fix: task.fix },
        )),
        TaskKind::Html => {
            let partials = task
                .partials
                .as_deref()
                .map(|p| root.join(p.trim().trim_start_matches("./")));
            let resolver = crate::transform::PartialResolver::new(partials)
                .map_err(|e| PipelineError::Other(e.into()))?;
            Arc::new(FileTask::new(
                name,
                task.kind,
                reload,
                sources,
                dest,
                html::RenderHtml { resolver },
            ))
        }
        TaskKind::Sass => Arc::new(FileTask::new(
            name,
            task.kind,
            reload,
            sources,
            dest,
            sass::CompileSass,
        )),
        TaskKind::Copy => Arc::new(FileTask::new(
            name,
            task.kind,
            reload,
            sources,
            dest,
            copy::CopyFile,
        )),
        TaskKind::Clean | TaskKind::Bundle | TaskKind::Lint => {
            return Err(PipelineError::ConfigError(format!(
                "task '{name}' of kind {} cannot be built here",
                task.kind
            )));
        }
    };
    Ok(built)
}
