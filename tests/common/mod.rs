#![allow(dead_code)]

use std::error::Error;
use std::sync::Arc;

use assetpipe::config::ConfigFile;
use assetpipe::pipeline::{Orchestrator, TaskContext};
use assetpipe::server::LiveReload;
use assetpipe::tasks::build_registry;
use assetpipe::types::BuildMode;

pub use assetpipe_test_utils::builders;
pub use assetpipe_test_utils::{Project, init_tracing, with_timeout};

pub type TestResult = Result<(), Box<dyn Error>>;

/// Orchestrator over `project` with a fresh live reload channel.
pub fn orchestrator(project: &Project, cfg: ConfigFile, mode: BuildMode) -> Orchestrator {
    orchestrator_with_reload(project, cfg, mode, LiveReload::new())
}

pub fn orchestrator_with_reload(
    project: &Project,
    cfg: ConfigFile,
    mode: BuildMode,
    reload: LiveReload,
) -> Orchestrator {
    let registry = build_registry(&cfg, project.root()).expect("building task registry");
    let ctx = TaskContext::new(project.root(), Arc::new(cfg), mode, reload);
    Orchestrator::new(ctx, registry)
}
