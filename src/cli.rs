// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Args, Parser, Subcommand, ValueEnum};

/// Command-line arguments for `assetpipe`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "assetpipe",
    version,
    about = "Build, watch and live-reload front-end assets.",
    long_about = None
)]
pub struct CliArgs {
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Entry point to run. Defaults to `build`.
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Clone, Args)]
pub struct GlobalArgs {
    /// Path to the config file (TOML).
    ///
    /// When the default `Assetpipe.toml` does not exist, a built-in
    /// `src/` -> `dist/` layout is used.
    #[arg(long, global = true, value_name = "PATH", default_value = DEFAULT_CONFIG)]
    pub config: String,

    /// Enable production transforms (minified bundles, collapsed HTML).
    ///
    /// Without this flag, the env var named by `[config].production_env`
    /// (default `NODE_ENV`) decides.
    #[arg(long, global = true)]
    pub production: bool,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `ASSETPIPE_LOG` or a default level will be used.
    #[arg(long, global = true, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Parse + validate, print the resolved plan, but don't run anything.
    #[arg(long, global = true)]
    pub dry_run: bool,

    /// Do not start the live reload server in watch mode.
    #[arg(long, global = true)]
    pub no_server: bool,
}

pub const DEFAULT_CONFIG: &str = "Assetpipe.toml";

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Clean, run every transform once, then watch and serve.
    Build {
        /// Exit after the build instead of watching.
        #[arg(long)]
        once: bool,

        /// Group (or task) to run as the build. Defaults to `build`.
        #[arg(long, value_name = "NAME")]
        group: Option<String>,
    },
    /// Watch and serve without an initial build.
    Watch {
        /// Run the `build` group before watching.
        #[arg(long)]
        initial_build: bool,
    },
    /// Run lint tasks; exits non-zero on error-level violations.
    Lint {
        /// Only run this lint task.
        #[arg(long, value_name = "NAME")]
        task: Option<String>,
    },
    /// Run lint tasks with auto-fix, overwriting sources in place.
    Fix {
        /// Only run this lint task.
        #[arg(long, value_name = "NAME")]
        task: Option<String>,
    },
    /// Run a single task or group once.
    Run {
        /// Task or group name.
        name: String,
    },
}

impl Default for Command {
    fn default() -> Self {
        Command::Build {
            once: false,
            group: None,
        }
    }
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
