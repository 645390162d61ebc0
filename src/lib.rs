// src/lib.rs

pub mod cli;
pub mod config;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod fs;
pub mod lint;
pub mod logging;
pub mod pipeline;
pub mod server;
pub mod tasks;
pub mod transform;
pub mod types;
pub mod watch;

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info, warn};

use crate::cli::{CliArgs, Command};
use crate::config::{BUILD_GROUP, ConfigFile, load_or_default, project_root};
use crate::engine::{CoreRuntime, Runtime, RuntimeEvent, RuntimeOptions};
use crate::errors::{PipelineError, Result};
use crate::exec::PipelineExecutor;
use crate::pipeline::{Orchestrator, TaskContext};
use crate::server::{LiveReload, ServerState};
use crate::tasks::{build_registry, lint_tasks, run_lint};
use crate::types::{BuildMode, TaskKind};
use crate::watch::{IgnoredDirs, build_profiles_from_config, spawn_watcher};

/// How long open event streams may delay server shutdown.
const SERVER_SHUTDOWN_GRACE: Duration = Duration::from_secs(2);

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading and production-mode resolution
/// - the task registry and orchestrator
/// - lint / fix entry points
/// - watcher, runtime and live reload server for watch mode
/// - Ctrl-C handling
pub async fn run(args: CliArgs) -> Result<()> {
    let config_path = PathBuf::from(&args.global.config);
    let cfg = Arc::new(load_or_default(&config_path)?);
    let root = project_root(&config_path);
    let mode = BuildMode::resolve(args.global.production, &cfg.settings().production_env);
    let command = args.command.clone().unwrap_or_default();
    debug!(?root, ?mode, ?command, "starting");

    match &command {
        Command::Lint { task } | Command::Fix { task } => {
            let fix = matches!(command, Command::Fix { .. });
            if args.global.dry_run {
                for t in lint_tasks(&cfg, task.as_deref())? {
                    println!("lint task: {}", t.name());
                }
                return Ok(());
            }
            return run_lint(&cfg, &root, task.as_deref(), fix).await.map(|_| ());
        }
        _ => {}
    }

    let reload = LiveReload::new();
    let ctx = TaskContext::new(root.clone(), Arc::clone(&cfg), mode, reload.clone());
    let registry = build_registry(&cfg, &root)?;
    let orchestrator = Arc::new(Orchestrator::new(ctx, registry));

    match command {
        Command::Build { once, group } => {
            let target = group.unwrap_or_else(|| BUILD_GROUP.to_string());
            if args.global.dry_run {
                print_plan(&orchestrator, &target)?;
                if !once {
                    print_bindings(&cfg);
                }
                return Ok(());
            }

            if once {
                orchestrator.run_named(&target).await?.into_result()?;
                return Ok(());
            }
            if let Err(e) = orchestrator.run_named(&target).await {
                error!("initial build failed: {e}; watching anyway");
            }
            watch_and_serve(orchestrator, &cfg, &root, reload, args.global.no_server).await
        }
        Command::Watch { initial_build } => {
            if args.global.dry_run {
                print_bindings(&cfg);
                return Ok(());
            }
            if initial_build {
                if let Err(e) = orchestrator.run_named(BUILD_GROUP).await {
                    error!("initial build failed: {e}; watching anyway");
                }
            }
            watch_and_serve(orchestrator, &cfg, &root, reload, args.global.no_server).await
        }
        Command::Run { name } => {
            if args.global.dry_run {
                return print_plan(&orchestrator, &name);
            }
            orchestrator.run_named(&name).await?.into_result()?;
            Ok(())
        }
        Command::Lint { .. } | Command::Fix { .. } => Ok(()),
    }
}

/// Watcher + runtime + (optionally) the live reload server, until Ctrl-C.
async fn watch_and_serve(
    orchestrator: Arc<Orchestrator>,
    cfg: &ConfigFile,
    root: &Path,
    reload: LiveReload,
    no_server: bool,
) -> Result<()> {
    let (rt_tx, rt_rx) = mpsc::channel::<RuntimeEvent>(64);

    let profiles = build_profiles_from_config(cfg)?;
    if profiles.is_empty() {
        warn!("no watch bindings configured; nothing will be rebuilt on change");
    }
    let _watcher = spawn_watcher(root, profiles, ignored_dirs(cfg), rt_tx.clone())?;

    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
    let server = if no_server {
        None
    } else {
        let addr = server_addr(cfg).await?;
        let state = ServerState::new(root.join(&cfg.settings().dist), reload);
        Some(tokio::spawn(async move {
            let shutdown = async {
                let _ = shutdown_rx.await;
            };
            if let Err(e) = server::serve(addr, state, shutdown).await {
                error!("live reload server failed: {e}");
            }
        }))
    };

    {
        let tx = rt_tx.clone();
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!("failed to listen for Ctrl+C: {e}");
                return;
            }
            info!("shutdown requested");
            let _ = tx.send(RuntimeEvent::ShutdownRequested).await;
        });
    }

    let core = CoreRuntime::from_config(cfg, RuntimeOptions::default());
    let executor = PipelineExecutor::new(orchestrator, rt_tx);
    let result = Runtime::new(core, rt_rx, executor).run().await;

    let _ = shutdown_tx.send(());
    if let Some(mut handle) = server {
        if tokio::time::timeout(SERVER_SHUTDOWN_GRACE, &mut handle)
            .await
            .is_err()
        {
            debug!("server did not stop in time; aborting open connections");
            handle.abort();
        }
    }
    result
}

/// The output root and every clean target: the pipeline's own writes must
/// not trigger rebuilds.
fn ignored_dirs(cfg: &ConfigFile) -> IgnoredDirs {
    let mut dirs = vec![cfg.settings().dist.clone(), ".git".to_string()];
    dirs.extend(
        cfg.tasks()
            .values()
            .filter(|t| t.kind == TaskKind::Clean)
            .filter_map(|t| t.dest.clone()),
    );
    IgnoredDirs::new(dirs)
}

async fn server_addr(cfg: &ConfigFile) -> Result<SocketAddr> {
    let server = cfg.server();
    tokio::net::lookup_host((server.host.as_str(), server.port))
        .await?
        .next()
        .ok_or_else(|| {
            PipelineError::ConfigError(format!(
                "[server] host {:?} does not resolve",
                server.host
            ))
        })
}

fn print_plan(orchestrator: &Orchestrator, target: &str) -> Result<()> {
    let plan = orchestrator.plan(target)?;
    println!("assetpipe dry-run: {target}");
    print!("{}", plan.render());
    Ok(())
}

fn print_bindings(cfg: &ConfigFile) {
    println!();
    println!("watch bindings ({}):", cfg.bindings().len());
    for (name, binding) in cfg.bindings() {
        println!("  - {name} -> {}", binding.run);
        println!("      watch: {:?}", binding.watch);
        if !binding.exclude.is_empty() {
            println!("      exclude: {:?}", binding.exclude);
        }
        println!("      queue: {}", cfg.binding_queues(binding));
        if binding.use_hash {
            println!("      use_hash: true");
        }
    }
}
