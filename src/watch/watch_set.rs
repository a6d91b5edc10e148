// src/watch/watch_set.rs

//! Computing and (re)registering the set of watched paths.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use tracing::{debug, info, warn};

use crate::config::WatchSection;
use crate::fs::FileSystem;

/// Directories (in walk order) plus explicit auxiliary files to subscribe to.
///
/// Never contains a directory whose base name is excluded, nor anything below
/// one. Rebuilt wholesale on every refresh.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WatchSet {
    pub dirs: Vec<PathBuf>,
    pub files: Vec<PathBuf>,
}

impl WatchSet {
    pub fn len(&self) -> usize {
        self.dirs.len() + self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dirs.is_empty() && self.files.is_empty()
    }

    pub fn contains_dir(&self, path: &Path) -> bool {
        self.dirs.iter().any(|d| d == path)
    }

    /// All paths, directories first.
    pub fn paths(&self) -> impl Iterator<Item = &PathBuf> {
        self.dirs.iter().chain(self.files.iter())
    }
}

/// Walk `root` depth-first and collect every directory that is not excluded.
///
/// - A directory whose base name is in `exclude_dirs` is skipped together
///   with its whole subtree. The root itself is always kept.
/// - A subdirectory that cannot be listed is logged and skipped; only an
///   unreadable root is an error.
/// - `extra_files` (relative to `root`) are appended unconditionally.
pub fn compute_watch_set(
    fs: &dyn FileSystem,
    root: &Path,
    exclude_dirs: &[String],
    extra_files: &[String],
) -> Result<WatchSet> {
    let mut set = WatchSet::default();

    // Listing the root up front turns an unusable root into a hard error.
    let root_entries = fs.list_dir(root)?;
    set.dirs.push(root.to_path_buf());

    // Stack of pending child lists, processed in reverse so the walk visits
    // entries in lexical order.
    let mut stack: Vec<PathBuf> = child_dirs(root_entries).rev().collect();

    while let Some(dir) = stack.pop() {
        if is_excluded_dir(&dir, exclude_dirs) {
            debug!(path = ?dir, "skipping excluded directory");
            continue;
        }

        set.dirs.push(dir.clone());

        match fs.list_dir(&dir) {
            Ok(entries) => stack.extend(child_dirs(entries).rev()),
            Err(err) => {
                warn!(path = ?dir, error = %err, "cannot read directory; not descending");
            }
        }
    }

    set.files = extra_files.iter().map(|f| root.join(f)).collect();

    Ok(set)
}

fn child_dirs(
    entries: Vec<crate::fs::DirEntryInfo>,
) -> impl DoubleEndedIterator<Item = PathBuf> {
    entries.into_iter().filter(|e| e.is_dir).map(|e| e.path)
}

fn is_excluded_dir(dir: &Path, exclude_dirs: &[String]) -> bool {
    dir.file_name()
        .map(|name| exclude_dirs.iter().any(|x| name == x.as_str()))
        .unwrap_or(false)
}

/// The notification capability, reduced to what the manager needs.
///
/// Production code uses [`crate::watch::NotifyRegistrar`]; tests record calls.
pub trait WatchRegistrar: Send {
    /// Subscribe to changes directly inside `path` (non-recursive).
    fn watch(&mut self, path: &Path) -> Result<()>;
    fn unwatch(&mut self, path: &Path) -> Result<()>;
}

/// Result of registering a watch set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistrationReport {
    pub registered: usize,
    pub failed: Vec<PathBuf>,
}

/// Owns the current watch set and keeps the registrar in sync with it.
pub struct WatchSetManager<R: WatchRegistrar> {
    fs: Arc<dyn FileSystem>,
    root: PathBuf,
    exclude_dirs: Vec<String>,
    extra_files: Vec<String>,
    registrar: R,
    /// Paths the registrar currently holds a subscription for.
    registered: Vec<PathBuf>,
    current: WatchSet,
}

impl<R: WatchRegistrar> std::fmt::Debug for WatchSetManager<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatchSetManager")
            .field("root", &self.root)
            .field("registered", &self.registered.len())
            .finish_non_exhaustive()
    }
}

impl<R: WatchRegistrar> WatchSetManager<R> {
    pub fn new(
        fs: Arc<dyn FileSystem>,
        root: impl Into<PathBuf>,
        watch: &WatchSection,
        registrar: R,
    ) -> Self {
        Self {
            fs,
            root: root.into(),
            exclude_dirs: watch.exclude_dirs.clone(),
            extra_files: watch.extra_files.clone(),
            registrar,
            registered: Vec::new(),
            current: WatchSet::default(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn current(&self) -> &WatchSet {
        &self.current
    }

    pub fn registered(&self) -> &[PathBuf] {
        &self.registered
    }

    pub fn registrar(&self) -> &R {
        &self.registrar
    }

    pub fn compute(&self) -> Result<WatchSet> {
        compute_watch_set(
            self.fs.as_ref(),
            &self.root,
            &self.exclude_dirs,
            &self.extra_files,
        )
    }

    /// Subscribe to every path in `set`.
    ///
    /// A path that fails to register is logged and skipped; the rest are
    /// still registered.
    pub fn register_all(&mut self, set: &WatchSet) -> RegistrationReport {
        let mut report = RegistrationReport::default();

        for path in set.paths() {
            match self.registrar.watch(path) {
                Ok(()) => {
                    debug!(?path, "watching");
                    self.registered.push(path.clone());
                    report.registered += 1;
                }
                Err(err) => {
                    warn!(?path, error = %err, "failed to watch path; skipping");
                    report.failed.push(path.clone());
                }
            }
        }

        report
    }

    /// Drop every existing subscription, then register a freshly computed
    /// watch set.
    ///
    /// The new set is computed before anything is unregistered, so a failed
    /// walk leaves the previous subscriptions in place.
    pub fn refresh(&mut self) -> Result<RegistrationReport> {
        let set = self.compute()?;

        for path in std::mem::take(&mut self.registered) {
            if let Err(err) = self.registrar.unwatch(&path) {
                // Removed directories are already gone from the backend.
                debug!(?path, error = %err, "unwatch failed; ignoring");
            }
        }

        let report = self.register_all(&set);
        info!(
            registered = report.registered,
            failed = report.failed.len(),
            "watch set refreshed"
        );
        self.current = set;

        Ok(report)
    }

    /// Whether a change at `path` may have changed the directory layout:
    /// it is a directory now, or it was one we were watching.
    pub fn affects_structure(&self, path: &Path) -> bool {
        self.fs.is_dir(path) || self.current.contains_dir(path)
    }
}
