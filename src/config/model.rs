// src/config/model.rs

use serde::Deserialize;

use crate::types::TriggerWhileBuildingBehaviour;

/// Configuration as read from `Devloop.toml`, before validation.
///
/// ```toml
/// [config]
/// triggered_while_building = "drop"
///
/// [watch]
/// debounce_ms = 500
/// exclude_dirs = ["node_modules", "dist", ".git", "build"]
/// extensions = [".go", ".svelte", ".css", ".html", ".ts", ".js"]
/// extra_files = ["golte.config.ts"]
///
/// [build]
/// steps = ["npx golte", "go build -o dist/{name} main.go"]
///
/// [run]
/// artifact_dir = "dist"
/// ```
///
/// Every section is optional; a missing file behaves like an empty one.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawConfigFile {
    #[serde(default)]
    pub config: ConfigSection,

    #[serde(default)]
    pub watch: WatchSection,

    #[serde(default)]
    pub build: BuildSection,

    #[serde(default)]
    pub run: RunSection,
}

/// `[config]` section.
#[derive(Debug, Clone, Copy, Deserialize, Default)]
pub struct ConfigSection {
    /// `"drop"` (default) or `"queue"`.
    #[serde(default)]
    pub triggered_while_building: TriggerWhileBuildingBehaviour,
}

/// `[watch]` section: what to watch and what counts as a relevant change.
#[derive(Debug, Clone, Deserialize)]
pub struct WatchSection {
    /// Quiescence window after the last relevant change, in milliseconds.
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    /// Directory base names that are never walked nor watched. Also used as
    /// path tokens by the change filter.
    #[serde(default = "default_exclude_dirs")]
    pub exclude_dirs: Vec<String>,

    /// Extra substrings that make a changed path irrelevant.
    #[serde(default = "default_ignore_markers")]
    pub ignore_markers: Vec<String>,

    /// File-name suffixes of editor/temp files.
    #[serde(default = "default_ignore_suffixes")]
    pub ignore_suffixes: Vec<String>,

    /// Source extensions that trigger a rebuild.
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,

    /// Files (relative to the project root) watched even if the walk skips
    /// them.
    #[serde(default = "default_extra_files")]
    pub extra_files: Vec<String>,
}

fn default_debounce_ms() -> u64 {
    500
}

fn default_exclude_dirs() -> Vec<String> {
    ["node_modules", "dist", ".git", "build"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_ignore_markers() -> Vec<String> {
    vec![".DS_Store".to_string()]
}

fn default_ignore_suffixes() -> Vec<String> {
    [".tmp", ".temp", "~"].into_iter().map(String::from).collect()
}

fn default_extensions() -> Vec<String> {
    [".go", ".svelte", ".css", ".html", ".ts", ".js"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_extra_files() -> Vec<String> {
    vec!["golte.config.ts".to_string()]
}

impl Default for WatchSection {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
            exclude_dirs: default_exclude_dirs(),
            ignore_markers: default_ignore_markers(),
            ignore_suffixes: default_ignore_suffixes(),
            extensions: default_extensions(),
            extra_files: default_extra_files(),
        }
    }
}

/// `[build]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct BuildSection {
    /// Shell command lines, run in order inside the project directory.
    /// `{name}` expands to the executable name.
    #[serde(default = "default_build_steps")]
    pub steps: Vec<String>,
}

fn default_build_steps() -> Vec<String> {
    vec![
        "npx golte".to_string(),
        "go build -o dist/{name} main.go".to_string(),
    ]
}

impl Default for BuildSection {
    fn default() -> Self {
        Self {
            steps: default_build_steps(),
        }
    }
}

/// `[run]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct RunSection {
    /// Executable name; defaults to the project directory's base name.
    #[serde(default)]
    pub binary: Option<String>,

    /// Directory (relative to the project root) holding the built executable.
    #[serde(default = "default_artifact_dir")]
    pub artifact_dir: String,
}

fn default_artifact_dir() -> String {
    "dist".to_string()
}

impl Default for RunSection {
    fn default() -> Self {
        Self {
            binary: None,
            artifact_dir: default_artifact_dir(),
        }
    }
}

/// Validated configuration.
///
/// Built once at startup and shared read-only (usually behind an `Arc`).
/// Extensions are normalised to carry a leading dot.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub config: ConfigSection,
    pub watch: WatchSection,
    pub build: BuildSection,
    pub run: RunSection,
}

impl ConfigFile {
    /// Construct a config without validation. Used by `TryFrom<RawConfigFile>`
    /// once the raw file has been checked.
    pub(crate) fn new_unchecked(
        config: ConfigSection,
        watch: WatchSection,
        build: BuildSection,
        run: RunSection,
    ) -> Self {
        Self {
            config,
            watch,
            build,
            run,
        }
    }

    /// Debounce window as a `Duration`.
    pub fn debounce(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.watch.debounce_ms)
    }
}

impl Default for ConfigFile {
    fn default() -> Self {
        // The built-in defaults always validate.
        let raw = RawConfigFile::default();
        let mut watch = raw.watch;
        watch.extensions = crate::config::validate::normalise_extensions(&watch.extensions);
        Self::new_unchecked(raw.config, watch, raw.build, raw.run)
    }
}
