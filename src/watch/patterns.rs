// src/watch/patterns.rs

use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use globset::{GlobSet, GlobSetBuilder};

use crate::config::ConfigFile;
use crate::engine::BindingName;
use crate::fs::{compile_glob, glob_base, to_slash};

/// Compiled watch/exclude globs of one `[watch.<name>]` binding.
///
/// Patterns are relative to the project root; `matches` takes root-relative
/// paths with forward slashes (e.g. `"src/css/site.css"`).
#[derive(Clone)]
pub struct BindingWatchProfile {
    name: BindingName,
    bases: Vec<PathBuf>,
    watch_set: GlobSet,
    exclude_set: Option<GlobSet>,
    use_hash: bool,
}

impl fmt::Debug for BindingWatchProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BindingWatchProfile")
            .field("name", &self.name)
            .field("use_hash", &self.use_hash)
            .finish_non_exhaustive()
    }
}

impl BindingWatchProfile {
    pub fn new(
        name: impl Into<BindingName>,
        watch: &[String],
        exclude: &[String],
        use_hash: bool,
    ) -> Result<Self> {
        let name = name.into();
        let watch_set = build_globset(watch)
            .with_context(|| format!("building watch globset for binding {name}"))?;
        let exclude_set = if exclude.is_empty() {
            None
        } else {
            Some(
                build_globset(exclude)
                    .with_context(|| format!("building exclude globset for binding {name}"))?,
            )
        };
        Ok(Self {
            bases: watch.iter().map(|p| glob_base(p)).collect(),
            name,
            watch_set,
            exclude_set,
            use_hash,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether this binding only fires when its watched content changed.
    pub fn use_hash(&self) -> bool {
        self.use_hash
    }

    pub fn matches(&self, rel_path: &str) -> bool {
        if !self.watch_set.is_match(rel_path) {
            return false;
        }
        match &self.exclude_set {
            Some(exclude) => !exclude.is_match(rel_path),
            None => true,
        }
    }
}

fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pat in patterns {
        builder.add(compile_glob(pat.trim().trim_start_matches("./"))?);
    }
    Ok(builder.build()?)
}

/// One profile per binding of `cfg`, in binding-name order.
pub fn build_profiles_from_config(cfg: &ConfigFile) -> Result<Vec<BindingWatchProfile>> {
    cfg.bindings()
        .iter()
        .map(|(name, b)| BindingWatchProfile::new(name, &b.watch, &b.exclude, b.use_hash))
        .collect()
}

/// Every existing file under `root` selected by `profile`, sorted.
///
/// Only the glob bases are walked, not the whole project.
pub fn collect_matching_files(root: &Path, profile: &BindingWatchProfile) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    let mut stack: Vec<PathBuf> = profile.bases.iter().map(|b| root.join(b)).collect();

    while let Some(path) = stack.pop() {
        if path.is_dir() {
            for entry in std::fs::read_dir(&path).with_context(|| format!("reading dir {:?}", path))? {
                stack.push(entry?.path());
            }
        } else if path.is_file() {
            if let Ok(rel) = path.strip_prefix(root) {
                if profile.matches(&to_slash(rel)) {
                    files.push(path);
                }
            }
        }
    }

    files.sort();
    files.dedup();
    Ok(files)
}
