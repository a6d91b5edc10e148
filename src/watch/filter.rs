// src/watch/filter.rs

//! Relevance filter for raw change events.

use std::collections::HashSet;
use std::path::Path;

use crate::config::ConfigFile;

/// Decides whether a changed path should (re)arm the debounce timer.
///
/// Built once from the config and shared read-only; evaluating a path does
/// not allocate lookup tables.
///
/// Two stages, both must pass:
/// 1. No exclusion token (excluded directory name, ignore marker) occurs
///    anywhere in the path, and the file name does not end in a temp suffix.
/// 2. The path has no extension, or its extension is a recognized source
///    extension.
#[derive(Debug, Clone)]
pub struct PathFilter {
    exclude_tokens: Vec<String>,
    ignore_suffixes: Vec<String>,
    extensions: HashSet<String>,
}

impl PathFilter {
    pub fn new<A, B, C>(exclude_tokens: A, ignore_suffixes: B, extensions: C) -> Self
    where
        A: IntoIterator,
        A::Item: Into<String>,
        B: IntoIterator,
        B::Item: Into<String>,
        C: IntoIterator,
        C::Item: Into<String>,
    {
        Self {
            exclude_tokens: exclude_tokens.into_iter().map(Into::into).collect(),
            ignore_suffixes: ignore_suffixes.into_iter().map(Into::into).collect(),
            extensions: extensions
                .into_iter()
                .map(|e| e.into().trim_start_matches('.').to_string())
                .collect(),
        }
    }

    pub fn from_config(cfg: &ConfigFile) -> Self {
        let tokens: Vec<String> = cfg
            .watch
            .exclude_dirs
            .iter()
            .chain(cfg.watch.ignore_markers.iter())
            .cloned()
            .collect();

        Self::new(
            tokens,
            cfg.watch.ignore_suffixes.iter().cloned(),
            cfg.watch.extensions.iter().cloned(),
        )
    }

    /// Whether a change to `path` is relevant for a rebuild.
    pub fn is_relevant(&self, path: &str) -> bool {
        !self.is_excluded(path) && self.has_accepted_extension(path)
    }

    /// First stage: an exclusion token occurs in the path or the file name
    /// ends in a temp suffix.
    pub fn is_excluded(&self, path: &str) -> bool {
        if self.exclude_tokens.iter().any(|t| path.contains(t.as_str())) {
            return true;
        }

        let file_name = Path::new(path)
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_default();
        self.ignore_suffixes
            .iter()
            .any(|s| file_name.ends_with(s.as_str()))
    }

    /// Second stage. Extensions are compared exactly; `main.GO` is not Go.
    pub fn has_accepted_extension(&self, path: &str) -> bool {
        match Path::new(path).extension() {
            // Extensionless files (Makefile, Dockerfile, .env) may be config.
            None => true,
            Some(ext) => self.extensions.contains(&*ext.to_string_lossy()),
        }
    }
}

impl Default for PathFilter {
    fn default() -> Self {
        Self::from_config(&ConfigFile::default())
    }
}
