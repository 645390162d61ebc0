// src/watch/hash.rs

//! Content hashes for `use_hash = true` bindings. Kept in memory only.

use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use blake3::Hasher;
use tracing::debug;

/// Hash of a single file's contents.
pub fn compute_file_hash(path: &Path) -> Result<String> {
    let mut hasher = Hasher::new();
    let mut file =
        File::open(path).with_context(|| format!("opening file for hashing: {:?}", path))?;
    let mut buf = [0u8; 8192];
    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hasher.finalize().to_hex().to_string())
}

/// Combine `(path, hash)` pairs into one digest. Paths are part of the
/// input so that renames change the aggregate.
pub fn compute_aggregate_hash(entries: &[(PathBuf, String)]) -> String {
    let mut sorted: Vec<&(PathBuf, String)> = entries.iter().collect();
    sorted.sort_by(|a, b| a.0.cmp(&b.0));

    let mut hasher = Hasher::new();
    for (path, hash) in sorted {
        hasher.update(path.to_string_lossy().as_bytes());
        hasher.update(b"\0");
        hasher.update(hash.as_bytes());
    }
    hasher.finalize().to_hex().to_string()
}

/// Per-file hashes, so an event re-reads only the file that changed.
#[derive(Debug, Default)]
pub struct FileCache {
    hashes: HashMap<PathBuf, String>,
}

impl FileCache {
    pub fn get_or_compute(&mut self, path: &Path) -> Result<String> {
        if let Some(hash) = self.hashes.get(path) {
            return Ok(hash.clone());
        }
        debug!("cache miss: hashing {:?}", path);
        let hash = compute_file_hash(path)?;
        self.hashes.insert(path.to_path_buf(), hash.clone());
        Ok(hash)
    }

    pub fn invalidate(&mut self, path: &Path) {
        self.hashes.remove(path);
    }
}

/// Last aggregate hash seen per binding, plus the file cache behind it.
#[derive(Debug, Default)]
pub struct MemoryHashStore {
    aggregates: HashMap<String, String>,
    files: FileCache,
}

impl MemoryHashStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load(&self, binding: &str) -> Option<&str> {
        self.aggregates.get(binding).map(String::as_str)
    }

    /// Record `hash` for `binding`; returns true if it differs from the
    /// previous value (or there was none).
    pub fn update(&mut self, binding: &str, hash: String) -> bool {
        match self.aggregates.get(binding) {
            Some(old) if *old == hash => false,
            _ => {
                self.aggregates.insert(binding.to_string(), hash);
                true
            }
        }
    }

    /// Aggregate hash over `files`, after dropping the cached hash of
    /// `changed`.
    pub fn aggregate(&mut self, changed: &Path, files: &[PathBuf]) -> Result<String> {
        self.files.invalidate(changed);
        let mut entries = Vec::with_capacity(files.len());
        for path in files {
            entries.push((path.clone(), self.files.get_or_compute(path)?));
        }
        Ok(compute_aggregate_hash(&entries))
    }
}
