#![allow(dead_code)]

use assetpipe::config::{
    ConfigFile, GroupConfig, RawConfigFile, TaskConfig, WatchConfig,
};
use assetpipe::errors::Result;
use assetpipe::types::{ReloadKind, TaskKind};

/// Builder for `ConfigFile` to simplify test setup.
#[derive(Default)]
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_task(mut self, name: &str, task: TaskConfig) -> Self {
        self.config.task.insert(name.to_string(), task);
        self
    }

    pub fn with_group(mut self, name: &str, group: GroupConfig) -> Self {
        self.config.group.insert(name.to_string(), group);
        self
    }

    pub fn with_binding(mut self, name: &str, binding: WatchConfig) -> Self {
        self.config.watch.insert(name.to_string(), binding);
        self
    }

    pub fn dist(mut self, dir: &str) -> Self {
        self.config.config.dist = dir.to_string();
        self
    }

    pub fn sourcemaps(mut self, on: bool) -> Self {
        self.config.config.sourcemaps = on;
        self
    }

    pub fn queue(mut self, on: bool) -> Self {
        self.config.config.queue = on;
        self
    }

    pub fn raw(self) -> RawConfigFile {
        self.config
    }

    pub fn try_build(self) -> Result<ConfigFile> {
        ConfigFile::try_from(self.config)
    }

    pub fn build(self) -> ConfigFile {
        self.try_build()
            .expect("Failed to build valid config from builder")
    }
}

/// Builder for `TaskConfig`.
pub struct TaskConfigBuilder {
    task: TaskConfig,
}

impl TaskConfigBuilder {
    pub fn new(kind: TaskKind) -> Self {
        Self {
            task: TaskConfig::new(kind),
        }
    }

    /// `kind` reading `src` into `dest`.
    pub fn transform(kind: TaskKind, src: &str, dest: &str) -> Self {
        Self::new(kind).src(src).dest(dest)
    }

    pub fn src(mut self, pattern: &str) -> Self {
        self.task.src.push(pattern.to_string());
        self
    }

    pub fn exclude(mut self, pattern: &str) -> Self {
        self.task.exclude.push(pattern.to_string());
        self
    }

    pub fn dest(mut self, dir: &str) -> Self {
        self.task.dest = Some(dir.to_string());
        self
    }

    pub fn reload(mut self, kind: ReloadKind) -> Self {
        self.task.reload = Some(kind);
        self
    }

    pub fn fix(mut self, val: bool) -> Self {
        self.task.fix = val;
        self
    }

    pub fn partials(mut self, dir: &str) -> Self {
        self.task.partials = Some(dir.to_string());
        self
    }

    pub fn entry(mut self, path: &str) -> Self {
        self.task.entry = Some(path.to_string());
        self
    }

    pub fn plugin(mut self, pattern: &str) -> Self {
        self.task.plugins.push(pattern.to_string());
        self
    }

    pub fn output(mut self, name: &str) -> Self {
        self.task.output = Some(name.to_string());
        self
    }

    pub fn build(self) -> TaskConfig {
        self.task
    }
}

/// A `[watch.<name>]` binding running `run` on changes to `watch`.
pub fn binding(watch: &[&str], run: &str) -> WatchConfig {
    WatchConfig {
        watch: watch.iter().map(|s| s.to_string()).collect(),
        exclude: Vec::new(),
        run: run.to_string(),
        queue: None,
        use_hash: false,
    }
}
