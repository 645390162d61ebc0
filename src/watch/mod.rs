// src/watch/mod.rs

//! File watching and change detection.
//!
//! This module is responsible for:
//! - Compiling `watch` / `exclude` glob patterns per binding.
//! - Wiring up a cross-platform filesystem watcher (`notify`).
//! - Optional content hashing so unchanged content does not start a pass.
//!
//! It does **not** know about tasks or groups; it only turns filesystem
//! changes into binding-level triggers.

pub mod event_handler;
pub mod hash;
pub mod path_utils;
pub mod patterns;
pub mod watcher;

pub use event_handler::{IgnoredDirs, process_file_change};
pub use hash::{MemoryHashStore, compute_aggregate_hash, compute_file_hash};
pub use patterns::{BindingWatchProfile, build_profiles_from_config, collect_matching_files};
pub use watcher::{WatcherHandle, spawn_watcher};
