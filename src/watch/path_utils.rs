// src/watch/path_utils.rs

//! Path helpers for the watcher.

use std::path::Path;

use crate::fs::to_slash;

/// `path` relative to `root` with forward slashes.
///
/// Falls back to comparing canonical paths (symlinked temp dirs on macOS
/// report `/private/var/...`). `None` if `path` is outside `root`.
pub fn relative_str(root: &Path, path: &Path) -> Option<String> {
    if let Ok(rel) = path.strip_prefix(root) {
        return Some(to_slash(rel));
    }

    let root_canon = root.canonicalize().ok()?;
    let path_canon = path
        .canonicalize()
        .or_else(|_| {
            // Deleted files cannot be canonicalized; try their directory.
            let parent = path.parent().ok_or(std::io::ErrorKind::NotFound)?;
            let name = path.file_name().ok_or(std::io::ErrorKind::NotFound)?;
            parent.canonicalize().map(|p| p.join(name))
        })
        .ok()?;
    path_canon.strip_prefix(&root_canon).ok().map(to_slash)
}

/// Whether root-relative `rel` is `dir` or lies below it.
pub fn is_within(rel: &str, dir: &str) -> bool {
    let dir = dir.trim_start_matches("./").trim_end_matches('/');
    if dir.is_empty() {
        return false;
    }
    rel == dir || rel.strip_prefix(dir).is_some_and(|rest| rest.starts_with('/'))
}
