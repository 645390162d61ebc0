// src/config/model.rs

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::types::{ReloadKind, TaskKind};

/// Top-level configuration as read from a TOML file.
///
/// ```toml
/// [config]
/// dist = "dist"
///
/// [task.css]
/// kind = "css"
/// src = ["src/css/**/*.css"]
/// dest = "dist/css"
///
/// [group.build]
/// series = ["clean", "assets"]
///
/// [watch.styles]
/// watch = ["src/css/**/*.css"]
/// run = "css"
/// ```
///
/// Every section is optional except `[task.*]`. This is the unvalidated
/// shape; the rest of the crate works with [`ConfigFile`].
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawConfigFile {
    #[serde(default)]
    pub config: ConfigSection,

    #[serde(default)]
    pub server: ServerSection,

    /// All tasks from `[task.<name>]`.
    #[serde(default)]
    pub task: BTreeMap<String, TaskConfig>,

    /// Task groups from `[group.<name>]`.
    #[serde(default)]
    pub group: BTreeMap<String, GroupConfig>,

    /// Watch bindings from `[watch.<name>]`.
    #[serde(default)]
    pub watch: BTreeMap<String, WatchConfig>,
}

/// `[config]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigSection {
    /// Output root, recreated by `clean` tasks.
    #[serde(default = "default_dist")]
    pub dist: String,

    /// Environment variable that switches on production mode when it equals
    /// `production`.
    #[serde(default = "default_production_env")]
    pub production_env: String,

    /// Emit `.map` files next to compiled Sass output.
    #[serde(default = "default_true")]
    pub sourcemaps: bool,

    /// Default for `[watch.*].queue`: remember one follow-up pass for
    /// changes that arrive while the binding is running.
    #[serde(default = "default_true")]
    pub queue: bool,
}

fn default_dist() -> String {
    "dist".to_string()
}

fn default_production_env() -> String {
    "NODE_ENV".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for ConfigSection {
    fn default() -> Self {
        Self {
            dist: default_dist(),
            production_env: default_production_env(),
            sourcemaps: true,
            queue: true,
        }
    }
}

/// `[server]` section for the live reload server.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerSection {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// `[task.<name>]` section.
///
/// Which fields matter depends on `kind`; validation rejects a transform
/// without `src`/`dest`, a bundle without `entry`, and so on.
#[derive(Debug, Clone, Deserialize)]
pub struct TaskConfig {
    pub kind: TaskKind,

    /// Input globs, relative to the project root.
    #[serde(default)]
    pub src: Vec<String>,

    /// Globs removed from the `src` matches.
    #[serde(default)]
    pub exclude: Vec<String>,

    /// Output directory. `clean` tasks default to `[config].dist`.
    #[serde(default)]
    pub dest: Option<String>,

    /// Override the browser signal sent after a run.
    #[serde(default)]
    pub reload: Option<ReloadKind>,

    /// `js`/`lint`: write auto-fixes back to the source files.
    #[serde(default)]
    pub fix: bool,

    /// `html`: directory that partial references resolve against.
    #[serde(default)]
    pub partials: Option<String>,

    /// `bundle`: entry module.
    #[serde(default)]
    pub entry: Option<String>,

    /// `bundle`: plugin scripts concatenated in front of the bundle into
    /// a `<stem>.min.js` file.
    #[serde(default)]
    pub plugins: Vec<String>,

    /// `bundle`: output file name, defaults to the entry's file name.
    #[serde(default)]
    pub output: Option<String>,
}

impl TaskConfig {
    /// A bare task of the given kind; handy for builders and defaults.
    pub fn new(kind: TaskKind) -> Self {
        Self {
            kind,
            src: Vec::new(),
            exclude: Vec::new(),
            dest: None,
            reload: None,
            fix: false,
            partials: None,
            entry: None,
            plugins: Vec::new(),
            output: None,
        }
    }

    /// Effective browser signal for this task.
    pub fn effective_reload(&self) -> ReloadKind {
        self.reload.unwrap_or_else(|| self.kind.default_reload())
    }
}

/// `[group.<name>]` section. Exactly one of `series` / `parallel`.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct GroupConfig {
    #[serde(default)]
    pub series: Option<Vec<String>>,

    #[serde(default)]
    pub parallel: Option<Vec<String>>,
}

impl GroupConfig {
    pub fn series<I, S>(members: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            series: Some(members.into_iter().map(Into::into).collect()),
            parallel: None,
        }
    }

    pub fn parallel<I, S>(members: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            series: None,
            parallel: Some(members.into_iter().map(Into::into).collect()),
        }
    }

    /// Member names regardless of composition mode.
    pub fn members(&self) -> &[String] {
        self.series
            .as_deref()
            .or(self.parallel.as_deref())
            .unwrap_or(&[])
    }
}

/// `[watch.<name>]` section: a watch binding.
#[derive(Debug, Clone, Deserialize)]
pub struct WatchConfig {
    /// Globs (relative to the project root) that trigger this binding.
    pub watch: Vec<String>,

    #[serde(default)]
    pub exclude: Vec<String>,

    /// Task or group to run on change.
    pub run: String,

    /// Queue one follow-up pass for changes during a running pass
    /// (`true`), or drop them (`false`). Falls back to `[config].queue`.
    #[serde(default)]
    pub queue: Option<bool>,

    /// Skip a pass when the watched content hash did not change.
    #[serde(default)]
    pub use_hash: bool,
}

/// A validated configuration.
///
/// Only obtainable through `TryFrom<RawConfigFile>` (see `validate.rs`),
/// which fills in default groups/bindings and checks every cross reference.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    settings: ConfigSection,
    server: ServerSection,
    tasks: BTreeMap<String, TaskConfig>,
    groups: BTreeMap<String, GroupConfig>,
    bindings: BTreeMap<String, WatchConfig>,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(raw: RawConfigFile) -> Self {
        Self {
            settings: raw.config,
            server: raw.server,
            tasks: raw.task,
            groups: raw.group,
            bindings: raw.watch,
        }
    }

    pub fn settings(&self) -> &ConfigSection {
        &self.settings
    }

    pub fn server(&self) -> &ServerSection {
        &self.server
    }

    pub fn tasks(&self) -> &BTreeMap<String, TaskConfig> {
        &self.tasks
    }

    pub fn task(&self, name: &str) -> Option<&TaskConfig> {
        self.tasks.get(name)
    }

    pub fn groups(&self) -> &BTreeMap<String, GroupConfig> {
        &self.groups
    }

    pub fn bindings(&self) -> &BTreeMap<String, WatchConfig> {
        &self.bindings
    }

    /// Effective `queue` flag of a binding.
    pub fn binding_queues(&self, binding: &WatchConfig) -> bool {
        binding.queue.unwrap_or(self.settings.queue)
    }

    /// Names of all `lint` tasks, in name order.
    pub fn lint_tasks(&self) -> Vec<String> {
        self.tasks
            .iter()
            .filter(|(_, t)| t.kind == crate::types::TaskKind::Lint)
            .map(|(name, _)| name.clone())
            .collect()
    }

    /// Returns true if `name` is a task or a group.
    pub fn is_runnable(&self, name: &str) -> bool {
        self.tasks.contains_key(name) || self.groups.contains_key(name)
    }
}
