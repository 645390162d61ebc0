// src/config/validate.rs

use globset::Glob;
use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;

use crate::config::defaults::{fill_default_bindings, fill_default_groups};
use crate::config::model::{ConfigFile, RawConfigFile, TaskConfig};
use crate::errors::{PipelineError, Result};
use crate::types::TaskKind;

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = crate::errors::PipelineError;

    fn try_from(mut raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        fill_default_groups(&mut raw);
        fill_default_bindings(&mut raw);
        validate_raw_config(&raw)?;
        Ok(ConfigFile::new_unchecked(raw))
    }
}

/// Validate an already-built config again (e.g. after programmatic edits).
pub fn validate_config(cfg: &RawConfigFile) -> Result<()> {
    validate_raw_config(cfg)
}

fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    ensure_has_tasks(cfg)?;
    validate_global_config(cfg)?;
    validate_tasks(cfg)?;
    validate_group_members(cfg)?;
    validate_group_graph(cfg)?;
    validate_bindings(cfg)?;
    validate_disjoint_outputs(cfg)?;
    Ok(())
}

fn config_err(msg: impl Into<String>) -> PipelineError {
    PipelineError::ConfigError(msg.into())
}

fn ensure_has_tasks(cfg: &RawConfigFile) -> Result<()> {
    if cfg.task.is_empty() {
        return Err(config_err(
            "config must contain at least one [task.<name>] section",
        ));
    }
    Ok(())
}

fn validate_global_config(cfg: &RawConfigFile) -> Result<()> {
    let dist = cfg.config.dist.trim();
    if dist.is_empty() || dist == "." || dist == "/" {
        return Err(config_err(format!(
            "[config].dist must name a dedicated output directory (got {:?})",
            cfg.config.dist
        )));
    }
    if cfg.config.production_env.trim().is_empty() {
        return Err(config_err("[config].production_env must not be empty"));
    }
    Ok(())
}

fn validate_tasks(cfg: &RawConfigFile) -> Result<()> {
    for (name, task) in cfg.task.iter() {
        if cfg.group.contains_key(name) {
            return Err(config_err(format!(
                "'{name}' is declared both as a task and as a group"
            )));
        }

        for pat in task.src.iter().chain(task.exclude.iter()) {
            check_glob(name, pat)?;
        }

        match task.kind {
            TaskKind::Clean => {
                if let Some(dest) = &task.dest {
                    let d = dest.trim();
                    if d.is_empty() || d == "." || d == "/" {
                        return Err(config_err(format!(
                            "clean task '{name}' must not target {dest:?}"
                        )));
                    }
                }
            }
            TaskKind::Lint => {
                if task.src.is_empty() {
                    return Err(config_err(format!("lint task '{name}' has no `src` globs")));
                }
            }
            TaskKind::Bundle => {
                if task.entry.is_none() {
                    return Err(config_err(format!("bundle task '{name}' has no `entry`")));
                }
                for pat in task.plugins.iter() {
                    check_glob(name, pat)?;
                }
                require_dest(name, task)?;
            }
            TaskKind::Css | TaskKind::Js | TaskKind::Html | TaskKind::Sass | TaskKind::Copy => {
                if task.src.is_empty() {
                    return Err(config_err(format!(
                        "{} task '{name}' has no `src` globs",
                        task.kind
                    )));
                }
                require_dest(name, task)?;
            }
        }
    }
    Ok(())
}

fn require_dest(name: &str, task: &TaskConfig) -> Result<()> {
    match task.dest.as_deref().map(str::trim) {
        Some(d) if !d.is_empty() => Ok(()),
        _ => Err(config_err(format!(
            "{} task '{name}' has no `dest`",
            task.kind
        ))),
    }
}

fn check_glob(owner: &str, pattern: &str) -> Result<()> {
    Glob::new(pattern)
        .map(|_| ())
        .map_err(|e| config_err(format!("'{owner}': invalid glob pattern {pattern:?}: {e}")))
}

fn validate_group_members(cfg: &RawConfigFile) -> Result<()> {
    for (name, group) in cfg.group.iter() {
        match (&group.series, &group.parallel) {
            (Some(_), Some(_)) => {
                return Err(config_err(format!(
                    "group '{name}' sets both `series` and `parallel`"
                )));
            }
            (None, None) => {
                return Err(config_err(format!(
                    "group '{name}' needs either `series` or `parallel`"
                )));
            }
            _ => {}
        }

        for member in group.members() {
            if member == name {
                return Err(PipelineError::GroupCycle(format!(
                    "group '{name}' contains itself"
                )));
            }
            match cfg.task.get(member) {
                Some(task) if task.kind == TaskKind::Lint => {
                    return Err(config_err(format!(
                        "group '{name}' references lint task '{member}'; lint tasks only run from the lint/fix entry points"
                    )));
                }
                Some(_) => {}
                None if cfg.group.contains_key(member) => {}
                None => {
                    return Err(config_err(format!(
                        "group '{name}' has unknown member '{member}'"
                    )));
                }
            }
        }
    }
    Ok(())
}

fn validate_group_graph(cfg: &RawConfigFile) -> Result<()> {
    // Edge direction: group -> member group.
    let mut graph: DiGraphMap<&str, ()> = DiGraphMap::new();

    for name in cfg.group.keys() {
        graph.add_node(name.as_str());
    }
    for (name, group) in cfg.group.iter() {
        for member in group.members() {
            if cfg.group.contains_key(member) {
                graph.add_edge(name.as_str(), member.as_str(), ());
            }
        }
    }

    match toposort(&graph, None) {
        Ok(_order) => Ok(()),
        Err(cycle) => Err(PipelineError::GroupCycle(format!(
            "cycle detected in task groups involving '{}'",
            cycle.node_id()
        ))),
    }
}

fn validate_bindings(cfg: &RawConfigFile) -> Result<()> {
    for (name, binding) in cfg.watch.iter() {
        if binding.watch.is_empty() {
            return Err(config_err(format!("watch binding '{name}' has no `watch` globs")));
        }
        for pat in binding.watch.iter().chain(binding.exclude.iter()) {
            check_glob(name, pat)?;
        }
        match cfg.task.get(&binding.run) {
            Some(task) if task.kind == TaskKind::Lint => {
                return Err(config_err(format!(
                    "watch binding '{name}' runs lint task '{}'",
                    binding.run
                )));
            }
            Some(_) => {}
            None if cfg.group.contains_key(&binding.run) => {}
            None => {
                return Err(config_err(format!(
                    "watch binding '{name}' runs unknown task or group '{}'",
                    binding.run
                )));
            }
        }
    }
    Ok(())
}

/// Two transform tasks with the same inputs and the same destination would
/// write the same files.
fn validate_disjoint_outputs(cfg: &RawConfigFile) -> Result<()> {
    let transforms: Vec<(&String, &TaskConfig)> = cfg
        .task
        .iter()
        .filter(|(_, t)| t.kind.is_transform())
        .collect();

    for (i, (a_name, a)) in transforms.iter().enumerate() {
        for (b_name, b) in transforms.iter().skip(i + 1) {
            let same_dest = normalize(a.dest.as_deref()) == normalize(b.dest.as_deref());
            if !same_dest {
                continue;
            }
            let same_src = !a.src.is_empty() && a.src == b.src;
            let same_bundle = a.kind == TaskKind::Bundle
                && b.kind == TaskKind::Bundle
                && a.output.is_some()
                && a.output == b.output;
            if same_src || same_bundle {
                return Err(config_err(format!(
                    "tasks '{a_name}' and '{b_name}' write the same outputs into {:?}",
                    a.dest.as_deref().unwrap_or_default()
                )));
            }
        }
    }
    Ok(())
}

fn normalize(path: Option<&str>) -> Option<String> {
    path.map(|p| p.trim().trim_start_matches("./").trim_end_matches('/').to_string())
}
