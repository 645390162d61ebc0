// src/config/mod.rs

//! Configuration loading and validation for assetpipe.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Provide the built-in layout and default groups/bindings (`defaults.rs`).
//! - Load a config file from disk (`loader.rs`).
//! - Validate cross references and group acyclicity (`validate.rs`).

pub mod defaults;
pub mod loader;
pub mod model;
pub mod validate;

pub use defaults::{default_raw_config, ASSETS_GROUP, BUILD_GROUP};
pub use loader::{load_and_validate, load_from_path, load_or_default, parse_str, project_root};
pub use model::{
    ConfigFile, ConfigSection, GroupConfig, RawConfigFile, ServerSection, TaskConfig, WatchConfig,
};
pub use validate::validate_config;
