// src/pipeline/orchestrator.rs

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Instant;

use anyhow::anyhow;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use crate::config::ConfigFile;
use crate::errors::{PipelineError, Result};
use crate::pipeline::graph::{Plan, TaskRegistry, resolve_plan};
use crate::pipeline::task::{PassSummary, Task, TaskContext, TaskReport};

type PlanFuture = Pin<Box<dyn Future<Output = Result<PassSummary>> + Send>>;

/// Runs named tasks and groups.
///
/// - A series member starts only after the previous one completed (success
///   or reported file failures). A fatal task error stops the series.
/// - Parallel members run concurrently; the group completes when every
///   member has completed, and reports the first fatal error (if any) after
///   all of them finished.
#[derive(Debug, Clone)]
pub struct Orchestrator {
    registry: Arc<TaskRegistry>,
    ctx: TaskContext,
}

impl Orchestrator {
    pub fn new(ctx: TaskContext, registry: TaskRegistry) -> Self {
        Self {
            registry: Arc::new(registry),
            ctx,
        }
    }

    pub fn config(&self) -> &ConfigFile {
        self.ctx.config()
    }

    pub fn context(&self) -> &TaskContext {
        &self.ctx
    }

    pub fn registry(&self) -> &TaskRegistry {
        &self.registry
    }

    /// Resolve `name` without running anything.
    pub fn plan(&self, name: &str) -> Result<Plan> {
        resolve_plan(self.ctx.config(), &self.registry, name)
    }

    /// Run the task or group `name` as one build pass.
    pub async fn run_named(&self, name: &str) -> Result<PassSummary> {
        let plan = self.plan(name)?;
        let started = Instant::now();
        info!(target = %name, "pass started");

        let result = run_plan(plan, self.ctx.for_pass()).await;

        match &result {
            Ok(summary) => info!(
                target = %name,
                written = summary.written_count(),
                failed = summary.failure_count(),
                elapsed_ms = started.elapsed().as_millis() as u64,
                "pass finished"
            ),
            Err(e) => error!(target = %name, "pass aborted: {e}"),
        }
        result
    }
}

/// Execute a plan tree. Boxed because series/parallel recurse.
pub fn run_plan(plan: Plan, ctx: TaskContext) -> PlanFuture {
    Box::pin(async move {
        match plan {
            Plan::Task(task) => run_task(task, &ctx).await.map(PassSummary::single),
            Plan::Series { name, members } => {
                debug!(group = %name, "series started");
                let mut summary = PassSummary::default();
                for member in members {
                    let member_name = member.name().to_string();
                    match run_plan(member, ctx.clone()).await {
                        Ok(s) => summary.merge(s),
                        Err(e) => {
                            warn!(group = %name, member = %member_name, "series halted");
                            return Err(e);
                        }
                    }
                }
                Ok(summary)
            }
            Plan::Parallel { name, members } => {
                debug!(group = %name, members = members.len(), "parallel started");
                let count = members.len();
                let mut set = JoinSet::new();
                for (idx, member) in members.into_iter().enumerate() {
                    let ctx = ctx.clone();
                    set.spawn(async move { (idx, run_plan(member, ctx).await) });
                }

                let mut slots: Vec<Option<Result<PassSummary>>> =
                    (0..count).map(|_| None).collect();
                while let Some(joined) = set.join_next().await {
                    match joined {
                        Ok((idx, res)) => slots[idx] = Some(res),
                        Err(e) => {
                            return Err(PipelineError::Other(anyhow!(
                                "task in group '{name}' panicked: {e}"
                            )));
                        }
                    }
                }

                // Member order, not completion order, decides the report
                // order and which error wins.
                let mut summary = PassSummary::default();
                let mut first_err = None;
                for res in slots.into_iter().flatten() {
                    match res {
                        Ok(s) => summary.merge(s),
                        Err(e) if first_err.is_none() => first_err = Some(e),
                        Err(e) => error!(group = %name, "additional failure: {e}"),
                    }
                }
                match first_err {
                    Some(e) => Err(e),
                    None => Ok(summary),
                }
            }
        }
    })
}

async fn run_task(task: Arc<dyn Task>, ctx: &TaskContext) -> Result<TaskReport> {
    let name = task.name().to_string();
    let started = Instant::now();
    debug!(task = %name, kind = %task.kind(), "task started");

    let report = match task.run(ctx).await {
        Ok(report) => report,
        Err(e) => {
            error!(task = %name, "task failed: {e}");
            ctx.reload().error(&name, e.to_string());
            return Err(e);
        }
    };

    for failure in &report.failures {
        warn!(task = %name, path = ?failure.path, "{}", failure.message);
        ctx.reload().error(
            &name,
            format!("{}: {}", failure.path.display(), failure.message),
        );
    }
    if !report.written.is_empty() {
        ctx.reload().notify(&name, task.reload());
    }

    info!(
        task = %name,
        written = report.written.len(),
        failed = report.failures.len(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "task finished"
    );
    Ok(report)
}
