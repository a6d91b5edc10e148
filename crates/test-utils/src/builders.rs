#![allow(dead_code)]

use devloop::config::{ConfigFile, RawConfigFile};
use devloop::types::TriggerWhileBuildingBehaviour;

/// Builder for `ConfigFile` to simplify test setup.
///
/// Starts from the built-in defaults and goes through the same validation
/// as a loaded `Devloop.toml`.
pub struct DevloopConfigBuilder {
    config: RawConfigFile,
}

impl DevloopConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile::default(),
        }
    }

    pub fn debounce_ms(mut self, ms: u64) -> Self {
        self.config.watch.debounce_ms = ms;
        self
    }

    pub fn behaviour(mut self, behaviour: TriggerWhileBuildingBehaviour) -> Self {
        self.config.config.triggered_while_building = behaviour;
        self
    }

    pub fn exclude_dir(mut self, name: &str) -> Self {
        self.config.watch.exclude_dirs.push(name.to_string());
        self
    }

    pub fn extensions(mut self, exts: &[&str]) -> Self {
        self.config.watch.extensions = exts.iter().map(|e| e.to_string()).collect();
        self
    }

    pub fn extra_files(mut self, files: &[&str]) -> Self {
        self.config.watch.extra_files = files.iter().map(|f| f.to_string()).collect();
        self
    }

    pub fn steps(mut self, steps: &[&str]) -> Self {
        self.config.build.steps = steps.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn binary(mut self, name: &str) -> Self {
        self.config.run.binary = Some(name.to_string());
        self
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }
}

impl Default for DevloopConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
