// src/types.rs

use std::fmt;

use serde::Deserialize;

/// The transform a `[task.<name>]` section performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskKind {
    /// Reset the output root.
    Clean,
    /// Minify plain CSS.
    Css,
    /// Lint (optionally fix) and copy JavaScript.
    Js,
    /// Resolve a module graph from an entry file into one script.
    Bundle,
    /// Inline partials, optionally collapse whitespace.
    Html,
    /// Compile SCSS, prefix and minify.
    Sass,
    /// Passthrough copy (fonts, images, video).
    Copy,
    /// Static analysis only; never part of a build group.
    Lint,
}

impl TaskKind {
    /// Reload signal sent after a successful run when the task does not
    /// override it.
    pub fn default_reload(self) -> ReloadKind {
        match self {
            TaskKind::Css | TaskKind::Sass => ReloadKind::Inject,
            TaskKind::Js | TaskKind::Bundle | TaskKind::Html | TaskKind::Copy => {
                ReloadKind::Reload
            }
            TaskKind::Clean | TaskKind::Lint => ReloadKind::None,
        }
    }

    /// Whether this kind reads `src` globs and writes into `dest`.
    pub fn is_transform(self) -> bool {
        !matches!(self, TaskKind::Clean | TaskKind::Lint)
    }
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TaskKind::Clean => "clean",
            TaskKind::Css => "css",
            TaskKind::Js => "js",
            TaskKind::Bundle => "bundle",
            TaskKind::Html => "html",
            TaskKind::Sass => "sass",
            TaskKind::Copy => "copy",
            TaskKind::Lint => "lint",
        };
        f.write_str(s)
    }
}

/// What connected browsers should do after a task finishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReloadKind {
    /// Hot-swap stylesheets without reloading the page.
    Inject,
    /// Full page reload.
    Reload,
    /// Do not notify.
    None,
}

/// Whether the pipeline runs with production transforms (minified bundles,
/// collapsed HTML whitespace).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BuildMode {
    #[default]
    Development,
    Production,
}

impl BuildMode {
    pub fn is_production(self) -> bool {
        self == BuildMode::Production
    }

    /// Resolve the mode from an explicit flag, falling back to the value of
    /// the environment variable `env_var`.
    pub fn resolve(flag: bool, env_var: &str) -> Self {
        if flag {
            return BuildMode::Production;
        }
        match std::env::var(env_var) {
            Ok(v) if v.trim().eq_ignore_ascii_case("production") => BuildMode::Production,
            _ => BuildMode::Development,
        }
    }
}
