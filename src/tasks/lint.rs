// src/tasks/lint.rs

//! `lint` tasks: run the rule sets over their globs, optionally fixing.

use std::path::Path;

use anyhow::Context;
use tracing::{debug, info, warn};

use crate::config::ConfigFile;
use crate::errors::{PipelineError, Result};
use crate::fs::{SourceSet, glob_base, write_output};
use crate::lint::{self, FileReport, Language, LintReport};
use crate::types::TaskKind;

#[derive(Debug, Clone)]
pub struct LintTask {
    name: String,
    src: Vec<String>,
    exclude: Vec<String>,
}

impl LintTask {
    pub fn new(name: impl Into<String>, src: Vec<String>, exclude: Vec<String>) -> Self {
        Self {
            name: name.into(),
            src,
            exclude,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Check every matched file; with `fix`, rewrite files that changed and
    /// report what is left.
    ///
    /// Patterns whose directory does not exist are skipped with a warning.
    pub async fn lint(&self, root: &Path, fix: bool) -> Result<LintReport> {
        let present: Vec<String> = self
            .src
            .iter()
            .filter(|p| {
                let exists = root.join(glob_base(p)).exists();
                if !exists {
                    warn!(task = %self.name, pattern = %p, "nothing to lint: directory missing");
                }
                exists
            })
            .cloned()
            .collect();

        let mut report = LintReport::default();
        if present.is_empty() {
            return Ok(report);
        }

        let files = SourceSet::new(&present, &self.exclude)?
            .expand(root)
            .await?;
        debug!(task = %self.name, files = files.len(), "linting");

        for file in files {
            let Some(lang) = Language::for_path(&file.path) else {
                continue;
            };
            let source = tokio::fs::read_to_string(&file.path)
                .await
                .with_context(|| format!("reading {:?}", file.path))?;

            let mut fixed = false;
            let text = if fix {
                let out = lint::fix(lang, &source);
                if out != source {
                    write_output(&file.path, &out).await?;
                    fixed = true;
                }
                out
            } else {
                source
            };

            let diagnostics = lint::check(lang, &text);
            if diagnostics.is_empty() && !fixed {
                continue;
            }
            let rel = file
                .path
                .strip_prefix(root)
                .map(Path::to_path_buf)
                .unwrap_or_else(|_| file.path.clone());
            report.push(FileReport {
                path: rel,
                diagnostics,
                fixed,
            });
        }
        Ok(report)
    }
}

/// Lint tasks of `cfg`, or only `only` when given.
pub fn lint_tasks(cfg: &ConfigFile, only: Option<&str>) -> Result<Vec<LintTask>> {
    let names = match only {
        Some(name) => match cfg.task(name) {
            Some(task) if task.kind == TaskKind::Lint => vec![name.to_string()],
            Some(task) => {
                return Err(PipelineError::ConfigError(format!(
                    "'{name}' is a {} task, not a lint task",
                    task.kind
                )));
            }
            None => return Err(PipelineError::TaskNotFound(name.to_string())),
        },
        None => cfg.lint_tasks(),
    };

    Ok(names
        .into_iter()
        .filter_map(|name| {
            let task = cfg.task(&name)?;
            Some(LintTask::new(name, task.src.clone(), task.exclude.clone()))
        })
        .collect())
}

/// Run the selected lint tasks and merge their reports.
pub async fn lint_all(
    cfg: &ConfigFile,
    root: &Path,
    only: Option<&str>,
    fix: bool,
) -> Result<LintReport> {
    let mut report = LintReport::default();
    for task in lint_tasks(cfg, only)? {
        report.merge(task.lint(root, fix).await?);
    }
    Ok(report)
}

/// Lint entry point: print the report to stdout and fail on any error.
pub async fn run_lint(
    cfg: &ConfigFile,
    root: &Path,
    only: Option<&str>,
    fix: bool,
) -> Result<LintReport> {
    let report = lint_all(cfg, root, only, fix).await?;
    let rendered = report.render();
    if !rendered.is_empty() {
        print!("{rendered}");
    }
    if fix {
        info!(files = report.fixed_count(), "auto-fix applied");
    }
    if report.has_errors() {
        return Err(PipelineError::LintFailed {
            errors: report.error_count(),
            files: report.files_with_errors(),
        });
    }
    Ok(report)
}

