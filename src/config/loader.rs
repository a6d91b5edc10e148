// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::Result;

/// Load a configuration file from a given path and return the raw
/// `RawConfigFile`.
///
/// This only performs TOML deserialization; use [`load_and_validate`] for
/// semantic checks.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawConfigFile> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;

    let config: RawConfigFile = toml::from_str(&contents)?;

    Ok(config)
}

/// Load a configuration file from path, validate it and normalise it.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<ConfigFile> {
    let raw_config = load_from_path(&path)?;
    let config = ConfigFile::try_from(raw_config)?;
    Ok(config)
}

/// Load the config at `path` if it exists, otherwise fall back to the
/// built-in defaults.
///
/// A file that exists but fails to parse or validate is still an error.
pub fn load_or_default(path: impl AsRef<Path>) -> Result<ConfigFile> {
    let path = path.as_ref();
    if path.is_file() {
        debug!(?path, "loading config file");
        load_and_validate(path)
    } else {
        debug!(?path, "no config file found; using defaults");
        Ok(ConfigFile::default())
    }
}

/// Default config location: `Devloop.toml` in the project root.
pub fn default_config_path(project_root: &Path) -> PathBuf {
    project_root.join("Devloop.toml")
}
