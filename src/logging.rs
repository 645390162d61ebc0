// src/logging.rs

//! `tracing` setup.
//!
//! The filter is, in order of precedence:
//! 1. `--log-level` (applies to assetpipe itself)
//! 2. `ASSETPIPE_LOG`, a full `EnvFilter` directive string such as
//!    `assetpipe=debug,tower_http=debug`
//! 3. `info`
//!
//! Dependency crates (the watcher backend, HTTP tracing, the Sass compiler)
//! are held at `warn` unless a directive names them. Logs go to stderr;
//! lint reports and the dry-run plan use stdout.

use anyhow::{Context, Result};
use tracing_subscriber::{EnvFilter, fmt};

use crate::cli::LogLevel;

const ENV_VAR: &str = "ASSETPIPE_LOG";
const QUIET_DEPS: &[&str] = &["notify", "tower_http", "hyper", "grass"];

pub fn init_logging(cli_level: Option<LogLevel>) -> Result<()> {
    let filter = match cli_level {
        Some(lvl) => with_quiet_deps(level_name(lvl)),
        None => match std::env::var(ENV_VAR) {
            Ok(directives) if !directives.trim().is_empty() => {
                EnvFilter::try_new(directives.trim())
                    .with_context(|| format!("invalid {ENV_VAR} filter"))?
            }
            _ => with_quiet_deps("info"),
        },
    };

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!("logging already initialised: {e}"))
}

fn with_quiet_deps(level: &str) -> EnvFilter {
    let mut directives = vec![level.to_string()];
    directives.extend(QUIET_DEPS.iter().map(|dep| format!("{dep}=warn")));
    EnvFilter::new(directives.join(","))
}

fn level_name(lvl: LogLevel) -> &'static str {
    match lvl {
        LogLevel::Error => "error",
        LogLevel::Warn => "warn",
        LogLevel::Info => "info",
        LogLevel::Debug => "debug",
        LogLevel::Trace => "trace",
    }
}
