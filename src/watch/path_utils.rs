// src/watch/path_utils.rs

//! Utility functions for path handling in the watcher.

use std::path::Path;

/// Convert a path into a string relative to `root`, with forward slashes.
///
/// - First we try a direct `strip_prefix(root)`.
/// - If that fails (symlinked roots, `/private/var` on macOS, ...) we
///   canonicalize both paths and try again. Removed files cannot be
///   canonicalized, so this second attempt only helps for live paths.
///
/// Returns `None` if the path cannot be related to `root`.
pub fn relative_str(root: &Path, path: &Path) -> Option<String> {
    if let Ok(rel) = path.strip_prefix(root) {
        return Some(to_forward_slashes(rel));
    }

    if let (Ok(root_canon), Ok(path_canon)) = (root.canonicalize(), path.canonicalize()) {
        if let Ok(rel) = path_canon.strip_prefix(&root_canon) {
            return Some(to_forward_slashes(rel));
        }
    }

    None
}

/// The string the change filter should look at: the root-relative path when
/// there is one, otherwise the full path.
///
/// Filtering on the relative form keeps a project that lives under, say,
/// `/home/me/build/app` from having every event rejected.
pub fn filter_key(root: &Path, path: &Path) -> String {
    relative_str(root, path).unwrap_or_else(|| to_forward_slashes(path))
}

fn to_forward_slashes(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}
