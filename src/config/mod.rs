// src/config/mod.rs

//! Configuration loading and validation for devloop.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load an optional `Devloop.toml` from disk (`loader.rs`).
//! - Validate and normalise it into an immutable [`ConfigFile`] (`validate.rs`).

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{default_config_path, load_and_validate, load_from_path, load_or_default};
pub use model::{
    BuildSection, ConfigFile, ConfigSection, RawConfigFile, RunSection, WatchSection,
};
