// src/config/validate.rs

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::{DevloopError, Result};

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = crate::errors::DevloopError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;

        let mut watch = raw.watch;
        watch.extensions = normalise_extensions(&watch.extensions);

        Ok(ConfigFile::new_unchecked(raw.config, watch, raw.build, raw.run))
    }
}

fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    validate_watch_section(cfg)?;
    validate_build_section(cfg)?;
    validate_run_section(cfg)?;
    Ok(())
}

fn validate_watch_section(cfg: &RawConfigFile) -> Result<()> {
    if cfg.watch.debounce_ms == 0 {
        return Err(DevloopError::ConfigError(
            "[watch].debounce_ms must be >= 1 (got 0)".to_string(),
        ));
    }

    ensure_no_blank("[watch].exclude_dirs", &cfg.watch.exclude_dirs)?;
    ensure_no_blank("[watch].extensions", &cfg.watch.extensions)?;
    ensure_no_blank("[watch].ignore_markers", &cfg.watch.ignore_markers)?;
    ensure_no_blank("[watch].ignore_suffixes", &cfg.watch.ignore_suffixes)?;

    for dir in &cfg.watch.exclude_dirs {
        if dir.contains('/') || dir.contains('\\') {
            return Err(DevloopError::ConfigError(format!(
                "[watch].exclude_dirs entries are directory names, not paths (got '{dir}')"
            )));
        }
    }

    Ok(())
}

fn validate_build_section(cfg: &RawConfigFile) -> Result<()> {
    if cfg.build.steps.is_empty() {
        return Err(DevloopError::ConfigError(
            "[build].steps must contain at least one command".to_string(),
        ));
    }
    ensure_no_blank("[build].steps", &cfg.build.steps)
}

fn validate_run_section(cfg: &RawConfigFile) -> Result<()> {
    if cfg.run.artifact_dir.trim().is_empty() {
        return Err(DevloopError::ConfigError(
            "[run].artifact_dir must not be empty".to_string(),
        ));
    }
    if let Some(binary) = &cfg.run.binary {
        if binary.trim().is_empty() {
            return Err(DevloopError::ConfigError(
                "[run].binary must not be empty when set".to_string(),
            ));
        }
    }
    Ok(())
}

fn ensure_no_blank(field: &str, values: &[String]) -> Result<()> {
    if values.iter().any(|v| v.trim().is_empty()) {
        return Err(DevloopError::ConfigError(format!(
            "{field} must not contain empty entries"
        )));
    }
    Ok(())
}

/// Make sure each extension starts with a dot, so `"ts"` and `".ts"` mean
/// the same thing. Case is kept.
pub(crate) fn normalise_extensions(exts: &[String]) -> Vec<String> {
    let mut out: Vec<String> = exts
        .iter()
        .map(|e| {
            let e = e.trim().to_string();
            if e.starts_with('.') { e } else { format!(".{e}") }
        })
        .collect();
    out.sort();
    out.dedup();
    out
}
