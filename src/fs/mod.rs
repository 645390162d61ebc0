// src/fs/mod.rs

//! Filesystem helpers shared by the tasks: glob expansion relative to the
//! project root, output writes, and the output-root reset.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Component, Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use globset::{Glob, GlobBuilder, GlobMatcher, GlobSet, GlobSetBuilder};
use tokio::fs;

/// One input file matched by a task's globs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    /// Absolute (root-joined) path.
    pub path: PathBuf,
    /// Path relative to the glob base, used to place the output.
    pub rel: PathBuf,
}

impl SourceFile {
    /// Output location of this file under `dest`.
    pub fn dest_path(&self, dest: &Path) -> PathBuf {
        dest.join(&self.rel)
    }
}

struct Pattern {
    base: PathBuf,
    matcher: GlobMatcher,
}

/// Compiled `src` + `exclude` globs of one task.
pub struct SourceSet {
    patterns: Vec<Pattern>,
    exclude: Option<GlobSet>,
}

impl fmt::Debug for SourceSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceSet")
            .field("bases", &self.patterns.iter().map(|p| &p.base).collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

impl SourceSet {
    pub fn new(include: &[String], exclude: &[String]) -> Result<Self> {
        let mut patterns = Vec::with_capacity(include.len());
        for pat in include {
            let pat = normalize_pattern(pat);
            let matcher = compile_glob(&pat)?.compile_matcher();
            patterns.push(Pattern {
                base: glob_base(&pat),
                matcher,
            });
        }

        let exclude = if exclude.is_empty() {
            None
        } else {
            let mut builder = GlobSetBuilder::new();
            for pat in exclude {
                let pat = normalize_pattern(pat);
                builder.add(compile_glob(&pat)?);
            }
            Some(builder.build()?)
        };

        Ok(Self { patterns, exclude })
    }

    /// Glob bases (relative to the project root), one per include pattern.
    pub fn bases(&self) -> impl Iterator<Item = &Path> {
        self.patterns.iter().map(|p| p.base.as_path())
    }

    /// Returns true if `rel_path` (relative to the project root, forward
    /// slashes) is selected by these globs.
    pub fn matches(&self, rel_path: &str) -> bool {
        if let Some(exclude) = &self.exclude {
            if exclude.is_match(rel_path) {
                return false;
            }
        }
        self.patterns.iter().any(|p| p.matcher.is_match(rel_path))
    }

    /// Walk every glob base under `root` and return the matching files,
    /// sorted by path.
    ///
    /// A glob base that does not exist is an error: the task's source
    /// directory is missing.
    pub async fn expand(&self, root: &Path) -> Result<Vec<SourceFile>> {
        let mut found: BTreeMap<PathBuf, PathBuf> = BTreeMap::new();

        for pattern in &self.patterns {
            let base_abs = root.join(&pattern.base);
            let meta = fs::metadata(&base_abs)
                .await
                .with_context(|| format!("source directory {:?} is not accessible", base_abs))?;

            // A literal pattern naming a single file.
            if meta.is_file() {
                let rel_root = to_slash(&pattern.base);
                if self.matches(&rel_root) {
                    let name = base_abs
                        .file_name()
                        .map(PathBuf::from)
                        .ok_or_else(|| anyhow!("invalid file pattern {:?}", pattern.base))?;
                    found.entry(base_abs.clone()).or_insert(name);
                }
                continue;
            }

            let mut stack = vec![base_abs.clone()];
            while let Some(dir) = stack.pop() {
                let mut entries = fs::read_dir(&dir)
                    .await
                    .with_context(|| format!("reading dir {:?}", dir))?;
                while let Some(entry) = entries.next_entry().await? {
                    let path = entry.path();
                    let file_type = entry.file_type().await?;
                    if file_type.is_dir() {
                        stack.push(path);
                        continue;
                    }
                    let Ok(rel_root) = path.strip_prefix(root) else {
                        continue;
                    };
                    let rel_root = to_slash(rel_root);
                    if !pattern.matcher.is_match(&rel_root) || !self.matches(&rel_root) {
                        continue;
                    }
                    let rel = path
                        .strip_prefix(&base_abs)
                        .map(Path::to_path_buf)
                        .unwrap_or_else(|_| PathBuf::from(&rel_root));
                    found.entry(path).or_insert(rel);
                }
            }
        }

        Ok(found
            .into_iter()
            .map(|(path, rel)| SourceFile { path, rel })
            .collect())
    }
}

/// `*` stays within one path segment; `**` crosses directories.
pub fn compile_glob(pat: &str) -> Result<Glob> {
    GlobBuilder::new(pat)
        .literal_separator(true)
        .build()
        .with_context(|| format!("invalid glob pattern: {pat}"))
}

/// Strip a leading `./` so patterns line up with root-relative paths.
fn normalize_pattern(pat: &str) -> String {
    pat.trim().trim_start_matches("./").to_string()
}

/// The literal directory prefix of a glob (what `glob-parent` computes):
/// `src/fonts/**/*` -> `src/fonts`, `src/**/*.html` -> `src`,
/// `src/js/index.js` -> `src/js/index.js`.
pub fn glob_base(pattern: &str) -> PathBuf {
    let pattern = normalize_pattern(pattern);
    let mut base = PathBuf::new();
    for part in pattern.split('/') {
        if part.is_empty() || part == "." {
            continue;
        }
        if part.contains(['*', '?', '[', '{']) {
            break;
        }
        base.push(part);
    }
    base
}

/// Render a relative path with forward slashes.
pub fn to_slash(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

/// Write `contents` to `path`, creating parent directories.
pub async fn write_output(path: &Path, contents: impl AsRef<[u8]>) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .await
            .with_context(|| format!("creating dir {:?}", parent))?;
    }
    fs::write(path, contents)
        .await
        .with_context(|| format!("writing file {:?}", path))
}

/// Delete `root` and everything in it if it exists, then create it empty.
///
/// Idempotent: a missing root is simply created.
pub async fn reset_output_root(root: &Path) -> std::io::Result<()> {
    match fs::metadata(root).await {
        Ok(meta) if meta.is_dir() => fs::remove_dir_all(root).await?,
        Ok(_) => fs::remove_file(root).await?,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => return Err(e),
    }
    fs::create_dir_all(root).await
}

/// Lexically normalise a path (`a/./b/../c` -> `a/c`) without touching the
/// filesystem.
pub fn lexical_normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for comp in path.components() {
        match comp {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}
