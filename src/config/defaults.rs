// src/config/defaults.rs

//! Built-in configuration used when no `Assetpipe.toml` exists, plus the
//! default groups and watch bindings derived for any config that leaves
//! them out.

use std::collections::BTreeMap;

use crate::config::model::{
    ConfigSection, GroupConfig, RawConfigFile, ServerSection, TaskConfig, WatchConfig,
};
use crate::fs::{glob_base, to_slash};
use crate::types::TaskKind;
use crate::watch::path_utils::is_within;

/// Name of the group the `build` entry point runs.
pub const BUILD_GROUP: &str = "build";

/// Name of the parallel group of transform tasks in the default build.
pub const ASSETS_GROUP: &str = "assets";

/// The classic layout:
///
/// ```text
/// src/css/**/*.css   -> dist/css     (minified)
/// src/js/**/*.js     -> dist/js      (linted, copied)
/// src/**/*.html      -> dist         (partials from src/partials)
/// src/fonts/**/*     -> dist/fonts
/// src/images/**/*    -> dist/images
/// ```
///
/// plus `eslint` and `stylelint` lint tasks.
pub fn default_raw_config() -> RawConfigFile {
    let mut task = BTreeMap::new();

    task.insert("clean".to_string(), TaskConfig::new(TaskKind::Clean));
    task.insert(
        "css".to_string(),
        transform(TaskKind::Css, &["src/css/**/*.css"], "dist/css"),
    );
    task.insert(
        "js".to_string(),
        transform(TaskKind::Js, &["src/js/**/*.js"], "dist/js"),
    );

    let mut html = transform(TaskKind::Html, &["src/**/*.html"], "dist");
    html.exclude = vec!["src/partials/**".to_string()];
    html.partials = Some("src/partials".to_string());
    task.insert("html".to_string(), html);

    task.insert(
        "fonts".to_string(),
        transform(TaskKind::Copy, &["src/fonts/**/*"], "dist/fonts"),
    );
    task.insert(
        "images".to_string(),
        transform(TaskKind::Copy, &["src/images/**/*"], "dist/images"),
    );

    let mut eslint = TaskConfig::new(TaskKind::Lint);
    eslint.src = vec!["src/js/**/*.js".to_string()];
    task.insert("eslint".to_string(), eslint);

    let mut stylelint = TaskConfig::new(TaskKind::Lint);
    stylelint.src = vec!["src/scss/**/*.scss".to_string()];
    task.insert("stylelint".to_string(), stylelint);

    RawConfigFile {
        config: ConfigSection::default(),
        server: ServerSection::default(),
        task,
        group: BTreeMap::new(),
        watch: BTreeMap::new(),
    }
}

fn transform(kind: TaskKind, src: &[&str], dest: &str) -> TaskConfig {
    let mut t = TaskConfig::new(kind);
    t.src = src.iter().map(|s| s.to_string()).collect();
    t.dest = Some(dest.to_string());
    t
}

/// Add `build = series(<clean tasks>, assets)` and
/// `assets = parallel(<transform tasks>)` when they are not declared.
///
/// Clean runs strictly before the transforms so that nothing is written
/// into an output root that is about to be deleted.
pub fn fill_default_groups(raw: &mut RawConfigFile) {
    if !raw.group.contains_key(ASSETS_GROUP) && !raw.task.contains_key(ASSETS_GROUP) {
        let transforms: Vec<String> = raw
            .task
            .iter()
            .filter(|(_, t)| t.kind.is_transform())
            .map(|(name, _)| name.clone())
            .collect();
        if !transforms.is_empty() {
            raw.group
                .insert(ASSETS_GROUP.to_string(), GroupConfig::parallel(transforms));
        }
    }

    if !raw.group.contains_key(BUILD_GROUP) && !raw.task.contains_key(BUILD_GROUP) {
        let mut members: Vec<String> = raw
            .task
            .iter()
            .filter(|(_, t)| t.kind == TaskKind::Clean)
            .map(|(name, _)| name.clone())
            .collect();
        if raw.group.contains_key(ASSETS_GROUP) {
            members.push(ASSETS_GROUP.to_string());
        }
        if !members.is_empty() {
            raw.group
                .insert(BUILD_GROUP.to_string(), GroupConfig::series(members));
        }
    }
}

/// Derive one watch binding per transform task when none are declared.
///
/// Each binding watches the task's own inputs and re-runs only that task.
/// Bundles watch every script next to (and below) their entry module. HTML
/// tasks also watch their partials directory, since a partial edit changes
/// every page that includes it.
pub fn fill_default_bindings(raw: &mut RawConfigFile) {
    if !raw.watch.is_empty() {
        return;
    }

    for (name, task) in raw.task.iter() {
        if !task.kind.is_transform() {
            continue;
        }

        let mut watch = task.src.clone();
        if task.kind == TaskKind::Bundle {
            if let Some(entry) = &task.entry {
                let dir = match entry.rfind('/') {
                    Some(idx) => &entry[..idx],
                    None => ".",
                };
                watch.push(format!("{dir}/**/*.js"));
            }
            watch.extend(task.plugins.iter().cloned());
        }
        let mut exclude = task.exclude.clone();
        if task.kind == TaskKind::Html {
            if let Some(partials) = task.partials.as_deref() {
                let dir = partials.trim().trim_start_matches("./").trim_end_matches('/');
                exclude.retain(|pattern| !is_within(&to_slash(&glob_base(pattern)), dir));
                if !dir.is_empty() {
                    watch.push(format!("{dir}/**/*"));
                }
            }
        }
        if watch.is_empty() {
            continue;
        }

        raw.watch.insert(
            name.clone(),
            WatchConfig {
                watch,
                exclude,
                run: name.clone(),
                queue: None,
                use_hash: false,
            },
        );
    }
}
