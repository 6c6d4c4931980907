//! Root path resolution.

use std::path::{Path, PathBuf};

/// Resolve a sweep root to an absolute path.
///
/// Relative roots are joined onto the current directory and `.` components
/// are dropped. `..` is kept: folding it without looking at the filesystem
/// would step out of a symlinked directory on the wrong side, so the OS
/// resolves it during the walk. Symlinks are NOT resolved either, because the
/// safety filter must see the path the user asked for and `canonicalize`
/// would add a `\\?\` prefix on Windows.
pub fn resolve_root(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}

/// Resolve every root, dropping duplicates while keeping first-seen order.
pub fn resolve_roots(paths: &[PathBuf]) -> Vec<PathBuf> {
    let mut resolved: Vec<PathBuf> = Vec::with_capacity(paths.len());
    for path in paths {
        let root = resolve_root(path);
        if !resolved.contains(&root) {
            resolved.push(root);
        }
    }
    resolved
}
