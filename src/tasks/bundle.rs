// src/tasks/bundle.rs

use std::path::PathBuf;

use anyhow::{Context, anyhow};
use tracing::debug;

use crate::errors::{PipelineError, Result};
use crate::fs::{SourceSet, write_output};
use crate::pipeline::{Task, TaskContext, TaskFuture, TaskReport};
use crate::transform::{bundle, minify_js};
use crate::types::{ReloadKind, TaskKind};

/// Bundle one entry module (plus optional plugin scripts) into `dest`.
#[derive(Debug)]
pub struct BundleTask {
    name: String,
    reload: ReloadKind,
    entry: PathBuf,
    dest: PathBuf,
    output: String,
    plugins: Option<SourceSet>,
}

impl BundleTask {
    pub fn new(
        name: impl Into<String>,
        reload: ReloadKind,
        entry: impl Into<PathBuf>,
        dest: impl Into<PathBuf>,
        output: Option<String>,
        plugins: Option<SourceSet>,
    ) -> anyhow::Result<Self> {
        let entry = entry.into();
        let output = match output {
            Some(o) => o,
            None => entry
                .file_name()
                .and_then(|n| n.to_str())
                .map(str::to_string)
                .ok_or_else(|| anyhow!("bundle entry {entry:?} has no file name"))?,
        };
        Ok(Self {
            name: name.into(),
            reload,
            entry,
            dest: dest.into(),
            output,
            plugins,
        })
    }

    /// `<stem>.min.js` next to the main output.
    fn plugin_output(&self) -> String {
        let stem = self
            .output
            .strip_suffix(".js")
            .unwrap_or(&self.output);
        format!("{stem}.min.js")
    }

    async fn build(&self, ctx: &TaskContext) -> Result<TaskReport> {
        let mut report = TaskReport::new(&self.name);
        let entry = ctx.resolve(&self.entry);
        let dest = ctx.resolve(&self.dest);
        let production = ctx.mode().is_production();

        if !tokio::fs::metadata(&entry).await.is_ok_and(|m| m.is_file()) {
            return Err(PipelineError::ConfigError(format!(
                "bundle task '{}': entry {:?} does not exist",
                self.name, self.entry
            )));
        }

        let plugin_files = match &self.plugins {
            Some(set) => set
                .expand(ctx.root())
                .await
                .map_err(|e| PipelineError::Other(e.context(format!("task '{}'", self.name))))?,
            None => Vec::new(),
        };

        let job_entry = entry.clone();
        let joined = tokio::task::spawn_blocking(move || -> anyhow::Result<String> {
            let code = bundle(&job_entry)?;
            if production {
                Ok(minify_js(&code).map_err(|e| anyhow!("minifying bundle: {e}"))?)
            } else {
                Ok(code)
            }
        })
        .await;

        let code = match joined {
            Ok(Ok(code)) => code,
            Ok(Err(e)) => {
                report.fail(&entry, format!("{e:#}"));
                return Ok(report);
            }
            Err(e) => {
                report.fail(&entry, format!("bundler panicked: {e}"));
                return Ok(report);
            }
        };
        debug!(task = %self.name, bytes = code.len(), "bundle built");

        let main = dest.join(&self.output);
        ctx.claims().claim(&main, &self.name)?;
        match write_output(&main, &code).await {
            Ok(()) => report.written.push(main),
            Err(e) => report.fail(&entry, format!("{e:#}")),
        }

        if !plugin_files.is_empty() {
            let mut parts = Vec::with_capacity(plugin_files.len() + 1);
            for file in &plugin_files {
                match tokio::fs::read_to_string(&file.path)
                    .await
                    .with_context(|| format!("reading plugin {:?}", file.path))
                {
                    Ok(text) if production => match minify_js(&text) {
                        Ok(min) => parts.push(min),
                        Err(e) => report.fail(&file.path, e.to_string()),
                    },
                    Ok(text) => parts.push(text),
                    Err(e) => report.fail(&file.path, format!("{e:#}")),
                }
            }
            parts.push(code);

            let combined = dest.join(self.plugin_output());
            ctx.claims().claim(&combined, &self.name)?;
            match write_output(&combined, parts.join("\r\n")).await {
                Ok(()) => report.written.push(combined),
                Err(e) => report.fail(&entry, format!("{e:#}")),
            }
        }

        Ok(report)
    }
}

impl Task for BundleTask {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> TaskKind {
        TaskKind::Bundle
    }

    fn reload(&self) -> ReloadKind {
        self.reload
    }

    fn run<'a>(&'a self, ctx: &'a TaskContext) -> TaskFuture<'a> {
        Box::pin(self.build(ctx))
    }
}
