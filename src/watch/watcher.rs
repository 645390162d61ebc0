// src/watch/watcher.rs

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use anyhow::Result;
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::engine::RuntimeEvent;
use crate::watch::event_handler::{IgnoredDirs, process_file_change};
use crate::watch::hash::MemoryHashStore;
use crate::watch::patterns::BindingWatchProfile;

/// Keeps the underlying `RecommendedWatcher` alive; dropping it stops
/// watching.
pub struct WatcherHandle {
    _inner: RecommendedWatcher,
}

impl std::fmt::Debug for WatcherHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatcherHandle").finish()
    }
}

/// Watch `root` recursively and send `RuntimeEvent::BindingTriggered` for
/// bindings whose globs match a changed path.
///
/// Access events are ignored, as is anything under `ignored` (the output
/// root), so the pipeline's own writes never retrigger it.
pub fn spawn_watcher(
    root: impl Into<PathBuf>,
    profiles: Vec<BindingWatchProfile>,
    ignored: IgnoredDirs,
    runtime_tx: mpsc::Sender<RuntimeEvent>,
) -> Result<WatcherHandle> {
    let root = root.into();
    let root = root.canonicalize().unwrap_or(root);
    let profiles = Arc::new(profiles);

    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<Event>();

    let mut watcher = RecommendedWatcher::new(
        move |res: notify::Result<Event>| match res {
            Ok(event) => {
                if event_tx.send(event).is_err() {
                    debug!("watch event loop gone; dropping notify event");
                }
            }
            Err(err) => warn!("file watch error: {err}"),
        },
        Config::default(),
    )?;
    watcher.watch(&root, RecursiveMode::Recursive)?;
    info!("file watcher started on {:?}", root);

    tokio::spawn(async move {
        let hashes = Arc::new(Mutex::new(MemoryHashStore::new()));

        while let Some(event) = event_rx.recv().await {
            if matches!(event.kind, EventKind::Access(_)) {
                continue;
            }
            debug!(?event, "received notify event");

            for path in event.paths {
                let open = process_file_change(
                    &root,
                    &path,
                    &profiles,
                    &ignored,
                    &runtime_tx,
                    Arc::clone(&hashes),
                )
                .await;
                if !open {
                    debug!("runtime closed; watcher event loop exiting");
                    return;
                }
            }
        }
        debug!("watcher event loop finished");
    });

    Ok(WatcherHandle { _inner: watcher })
}
