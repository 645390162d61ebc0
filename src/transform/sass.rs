// src/transform/sass.rs

use std::path::{Path, PathBuf};

use anyhow::{Result, anyhow};

/// Files named `_*.scss` are only ever imported.
pub fn is_partial(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.starts_with('_'))
}

/// Compile one SCSS entry to (expanded) CSS.
///
/// `@use`/`@import` resolve relative to the file first, then `load_paths`.
pub fn compile_scss(path: &Path, load_paths: &[PathBuf]) -> Result<String> {
    let options = load_paths
        .iter()
        .fold(grass::Options::default(), |opts, dir| opts.load_path(dir))
        .style(grass::OutputStyle::Expanded);

    grass::from_path(path, &options).map_err(|e| anyhow!("{}: {e}", path.display()))
}
