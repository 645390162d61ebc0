// src/watch/event_handler.rs

//! Turn one changed path into binding triggers.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::engine::{RuntimeEvent, TriggerReason};
use crate::watch::hash::MemoryHashStore;
use crate::watch::path_utils::{is_within, relative_str};
use crate::watch::patterns::{BindingWatchProfile, collect_matching_files};

/// Paths the watcher never reacts to: the output root (the pipeline's own
/// writes) and VCS metadata.
#[derive(Debug, Clone, Default)]
pub struct IgnoredDirs {
    dirs: Vec<String>,
}

impl IgnoredDirs {
    pub fn new<I, S>(dirs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            dirs: dirs.into_iter().map(Into::into).collect(),
        }
    }

    pub fn contains(&self, rel: &str) -> bool {
        self.dirs.iter().any(|d| is_within(rel, d))
    }
}

/// Process a single changed path:
/// 1. relativize against the root and drop ignored locations
/// 2. find every binding whose globs match
/// 3. apply the content-hash check for `use_hash` bindings
/// 4. send `BindingTriggered` to the runtime
///
/// Returns false once the runtime channel is closed.
pub async fn process_file_change(
    root: &Path,
    path: &Path,
    profiles: &Arc<Vec<BindingWatchProfile>>,
    ignored: &IgnoredDirs,
    runtime_tx: &mpsc::Sender<RuntimeEvent>,
    hashes: Arc<Mutex<MemoryHashStore>>,
) -> bool {
    let Some(rel) = relative_str(root, path) else {
        debug!(?path, "event outside the project root ignored");
        return true;
    };
    if ignored.contains(&rel) {
        return true;
    }

    for profile in profiles.iter().filter(|p| p.matches(&rel)) {
        if !should_trigger(root, path, &rel, profile, Arc::clone(&hashes)).await {
            continue;
        }
        debug!(binding = %profile.name(), path = %rel, "watch match -> triggering binding");
        if let Err(err) = runtime_tx
            .send(RuntimeEvent::BindingTriggered {
                binding: profile.name().to_string(),
                reason: TriggerReason::FileWatch,
            })
            .await
        {
            warn!("failed to send RuntimeEvent::BindingTriggered: {err}");
            return false;
        }
    }
    true
}

/// For `use_hash` bindings, trigger only when the aggregate hash of all
/// watched files changed. Any hashing problem errs on the side of
/// triggering.
async fn should_trigger(
    root: &Path,
    changed: &Path,
    rel: &str,
    profile: &BindingWatchProfile,
    hashes: Arc<Mutex<MemoryHashStore>>,
) -> bool {
    if !profile.use_hash() {
        return true;
    }

    let root: PathBuf = root.to_path_buf();
    let changed = changed.to_path_buf();
    let profile = profile.clone();
    let rel = rel.to_string();

    tokio::task::spawn_blocking(move || {
        let name = profile.name().to_string();
        let files = match collect_matching_files(&root, &profile) {
            Ok(f) => f,
            Err(err) => {
                warn!(binding = %name, error = %err, "failed to collect watched files; triggering anyway");
                return true;
            }
        };

        let Ok(mut store) = hashes.lock() else {
            warn!(binding = %name, "hash store mutex poisoned; triggering anyway");
            return true;
        };

        match store.aggregate(&changed, &files) {
            Ok(hash) => {
                if store.update(&name, hash) {
                    true
                } else {
                    info!(binding = %name, path = %rel, "watched content unchanged; skipping");
                    false
                }
            }
            Err(err) => {
                warn!(binding = %name, error = %err, "hashing failed; triggering anyway");
                true
            }
        }
    })
    .await
    .unwrap_or(true)
}
