// src/pipeline/graph.rs

//! Resolve a task or group name into an executable plan tree.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::config::ConfigFile;
use crate::errors::{PipelineError, Result};
use crate::pipeline::task::Task;

/// Every constructed task, by name.
#[derive(Default, Clone)]
pub struct TaskRegistry {
    tasks: BTreeMap<String, Arc<dyn Task>>,
}

impl fmt::Debug for TaskRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.tasks.keys()).finish()
    }
}

impl TaskRegistry {
    pub fn insert(&mut self, task: Arc<dyn Task>) {
        self.tasks.insert(task.name().to_string(), task);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Task>> {
        self.tasks.get(name).cloned()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.tasks.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

/// A composed unit of execution: a task, or a series/parallel group of
/// nested plans.
#[derive(Clone)]
pub enum Plan {
    Task(Arc<dyn Task>),
    Series { name: String, members: Vec<Plan> },
    Parallel { name: String, members: Vec<Plan> },
}

impl fmt::Debug for Plan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Plan::Task(task) => write!(f, "{}", task.name()),
            Plan::Series { name, members } => {
                write!(f, "{name}=series")?;
                f.debug_list().entries(members).finish()
            }
            Plan::Parallel { name, members } => {
                write!(f, "{name}=parallel")?;
                f.debug_list().entries(members).finish()
            }
        }
    }
}

impl Plan {
    pub fn name(&self) -> &str {
        match self {
            Plan::Task(task) => task.name(),
            Plan::Series { name, .. } | Plan::Parallel { name, .. } => name,
        }
    }

    /// Task names in the order a series walk would reach them.
    pub fn task_names(&self) -> Vec<String> {
        let mut out = Vec::new();
        self.collect_names(&mut out);
        out
    }

    fn collect_names(&self, out: &mut Vec<String>) {
        match self {
            Plan::Task(task) => out.push(task.name().to_string()),
            Plan::Series { members, .. } | Plan::Parallel { members, .. } => {
                for m in members {
                    m.collect_names(out);
                }
            }
        }
    }

    /// Render the plan as an indented tree (used by `--dry-run`).
    pub fn render(&self) -> String {
        let mut out = String::new();
        self.render_into(&mut out, 0);
        out
    }

    fn render_into(&self, out: &mut String, depth: usize) {
        let pad = "  ".repeat(depth);
        match self {
            Plan::Task(task) => {
                out.push_str(&format!("{pad}{} ({})\n", task.name(), task.kind()));
            }
            Plan::Series { name, members } => {
                out.push_str(&format!("{pad}{name}: series\n"));
                for m in members {
                    m.render_into(out, depth + 1);
                }
            }
            Plan::Parallel { name, members } => {
                out.push_str(&format!("{pad}{name}: parallel\n"));
                for m in members {
                    m.render_into(out, depth + 1);
                }
            }
        }
    }
}

/// Resolve `name` (a task or a group) against the config and registry.
pub fn resolve_plan(cfg: &ConfigFile, registry: &TaskRegistry, name: &str) -> Result<Plan> {
    let mut stack = Vec::new();
    resolve_inner(cfg, registry, name, &mut stack)
}

fn resolve_inner(
    cfg: &ConfigFile,
    registry: &TaskRegistry,
    name: &str,
    stack: &mut Vec<String>,
) -> Result<Plan> {
    if let Some(task) = registry.get(name) {
        return Ok(Plan::Task(task));
    }

    let Some(group) = cfg.groups().get(name) else {
        return Err(PipelineError::TaskNotFound(name.to_string()));
    };

    if stack.iter().any(|g| g == name) {
        stack.push(name.to_string());
        return Err(PipelineError::GroupCycle(stack.join(" -> ")));
    }
    stack.push(name.to_string());

    let members = group
        .members()
        .iter()
        .map(|m| resolve_inner(cfg, registry, m, stack))
        .collect::<Result<Vec<_>>>()?;

    stack.pop();

    Ok(if group.series.is_some() {
        Plan::Series {
            name: name.to_string(),
            members,
        }
    } else {
        Plan::Parallel {
            name: name.to_string(),
            members,
        }
    })
}
