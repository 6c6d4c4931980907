//! Top-down directory walker with an explicit prune contract.
//!
//! Each directory is listed once and handed to a [`DirVisitor`] before any of
//! its children are entered. The visitor answers with a [`Descent`] naming the
//! subdirectories that must not be entered; the walker applies it before it
//! schedules anything below the current directory. This is what lets the
//! sweeper delete a `__pycache__` and guarantee the walk never goes inside
//! it, whether or not the removal worked.
//!
//! Safety invariants:
//! - Symlinks are never followed. A symlink is reported as a file entry.
//! - A failure to list the root is fatal for the walk ([`SweepError::Traversal`]).
//! - A failure to list anything below the root is reported to the visitor and
//!   skipped.

#![allow(missing_docs)]

use std::ffi::{OsStr, OsString};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::core::errors::{Result, SweepError};

/// One traversal step: a directory and its immediate children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirVisit {
    pub dir: PathBuf,
    /// Distance from the root; the root itself is depth 0.
    pub depth: usize,
    /// Names of child directories, sorted.
    pub subdirs: Vec<OsString>,
    /// Names of every other child (regular files, symlinks, sockets...), sorted.
    pub files: Vec<OsString>,
}

impl DirVisit {
    /// Whether a child directory named `name` is present.
    pub fn has_subdir(&self, name: &str) -> bool {
        self.subdirs.iter().any(|s| s == name)
    }
}

/// The visitor's answer for one directory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Descent {
    pruned: Vec<OsString>,
    stop: bool,
}

impl Descent {
    /// Enter every subdirectory.
    pub fn descend_all() -> Self {
        Self::default()
    }

    /// Abort the walk after this directory.
    pub fn stop() -> Self {
        Self {
            pruned: Vec::new(),
            stop: true,
        }
    }

    /// Do not enter the child directory `name`.
    pub fn prune(&mut self, name: impl Into<OsString>) {
        self.pruned.push(name.into());
    }

    pub fn is_pruned(&self, name: &OsStr) -> bool {
        self.pruned.iter().any(|p| p == name)
    }

    pub const fn is_stop(&self) -> bool {
        self.stop
    }
}

/// Callbacks driven by [`TopDownWalker::walk`].
pub trait DirVisitor {
    /// Inspect one directory and decide which children to skip.
    fn visit(&mut self, visit: &DirVisit) -> Descent;

    /// A directory below the root could not be listed. It is skipped.
    fn unreadable(&mut self, _dir: &Path, _error: &io::Error) {}
}

/// How a walk ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalkOutcome {
    /// Every reachable, non-pruned directory was visited.
    Completed { directories: usize },
    /// The visitor returned [`Descent::stop`].
    Stopped { directories: usize },
}

impl WalkOutcome {
    pub const fn directories(self) -> usize {
        match self {
            Self::Completed { directories } | Self::Stopped { directories } => directories,
        }
    }
}

/// Depth-first, pre-order walker over a single root.
#[derive(Debug, Clone)]
pub struct TopDownWalker {
    root: PathBuf,
}

impl TopDownWalker {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Walk the tree, calling `visitor` for each directory before its children.
    ///
    /// Children are entered in name order, so the sequence of visits is
    /// deterministic for a given tree.
    pub fn walk(&self, visitor: &mut dyn DirVisitor) -> Result<WalkOutcome> {
        let mut stack: Vec<(PathBuf, usize)> = vec![(self.root.clone(), 0)];
        let mut directories = 0usize;

        while let Some((dir, depth)) = stack.pop() {
            let visit = match list_directory(&dir, depth) {
                Ok(visit) => visit,
                Err(source) if depth == 0 => {
                    return Err(SweepError::Traversal { root: dir, source });
                }
                Err(err) => {
                    visitor.unreadable(&dir, &err);
                    continue;
                }
            };
            directories += 1;

            let descent = visitor.visit(&visit);
            if descent.is_stop() {
                return Ok(WalkOutcome::Stopped { directories });
            }

            // Reverse so the lexicographically first child is popped first.
            for name in visit.subdirs.iter().rev() {
                if descent.is_pruned(name) {
                    continue;
                }
                stack.push((dir.join(name), depth + 1));
            }
        }

        Ok(WalkOutcome::Completed { directories })
    }
}

/// List one directory without following symlinks.
fn list_directory(dir: &Path, depth: usize) -> io::Result<DirVisit> {
    let entries = fs::read_dir(dir)?;

    let mut subdirs = Vec::new();
    let mut files = Vec::new();
    for entry_result in entries {
        // An entry that disappears or errors mid-listing is skipped.
        let Ok(entry) = entry_result else {
            continue;
        };
        let is_dir = entry.file_type().is_ok_and(|ft| ft.is_dir());
        if is_dir {
            subdirs.push(entry.file_name());
        } else {
            files.push(entry.file_name());
        }
    }
    subdirs.sort();
    files.sort();

    Ok(DirVisit {
        dir: dir.to_path_buf(),
        depth,
        subdirs,
        files,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Records every visit and prunes any child named in `prune`.
    #[derive(Default)]
    struct Recorder {
        visited: Vec<PathBuf>,
        prune: Vec<&'static str>,
        stop_after: Option<usize>,
        unreadable: Vec<PathBuf>,
    }

    impl DirVisitor for Recorder {
        fn visit(&mut self, visit: &DirVisit) -> Descent {
            self.visited.push(visit.dir.clone());
            if self.stop_after == Some(self.visited.len()) {
                return Descent::stop();
            }
            let mut descent = Descent::descend_all();
            for name in &self.prune {
                if visit.has_subdir(name) {
                    descent.prune(*name);
                }
            }
            descent
        }

        fn unreadable(&mut self, dir: &Path, _error: &io::Error) {
            self.unreadable.push(dir.to_path_buf());
        }
    }

    fn tree() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("b/inner")).unwrap();
        fs::create_dir_all(root.join("a/skip/deep")).unwrap();
        fs::write(root.join("a/one.txt"), "1").unwrap();
        fs::write(root.join("top.txt"), "t").unwrap();
        dir
    }

    #[test]
    fn visits_parents_before_children_in_name_order() {
        let dir = tree();
        let root = dir.path();
        let mut rec = Recorder::default();

        let outcome = TopDownWalker::new(root).walk(&mut rec).unwrap();

        assert_eq!(
            rec.visited,
            vec![
                root.to_path_buf(),
                root.join("a"),
                root.join("a/skip"),
                root.join("a/skip/deep"),
                root.join("b"),
                root.join("b/inner"),
            ]
        );
        assert_eq!(outcome, WalkOutcome::Completed { directories: 6 });
    }

    #[test]
    fn pruned_children_are_never_entered() {
        let dir = tree();
        let root = dir.path();
        let mut rec = Recorder {
            prune: vec!["skip"],
            ..Recorder::default()
        };

        TopDownWalker::new(root).walk(&mut rec).unwrap();

        assert!(!rec.visited.contains(&root.join("a/skip")));
        assert!(!rec.visited.contains(&root.join("a/skip/deep")));
        assert!(rec.visited.contains(&root.join("b/inner")));
    }

    #[test]
    fn listing_separates_files_from_directories() {
        let dir = tree();
        let mut seen = None;
        struct Capture<'a>(&'a mut Option<DirVisit>);
        impl DirVisitor for Capture<'_> {
            fn visit(&mut self, visit: &DirVisit) -> Descent {
                if visit.depth == 0 {
                    *self.0 = Some(visit.clone());
                }
                Descent::stop()
            }
        }

        TopDownWalker::new(dir.path())
            .walk(&mut Capture(&mut seen))
            .unwrap();

        let root_visit = seen.unwrap();
        assert_eq!(root_visit.subdirs, vec![OsString::from("a"), OsString::from("b")]);
        assert_eq!(root_visit.files, vec![OsString::from("top.txt")]);
    }

    #[test]
    fn stop_ends_the_walk_early() {
        let dir = tree();
        let mut rec = Recorder {
            stop_after: Some(2),
            ..Recorder::default()
        };

        let outcome = TopDownWalker::new(dir.path()).walk(&mut rec).unwrap();

        assert_eq!(outcome, WalkOutcome::Stopped { directories: 2 });
        assert_eq!(rec.visited.len(), 2);
    }

    #[test]
    fn missing_root_is_a_traversal_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");
        let mut rec = Recorder::default();

        let err = TopDownWalker::new(&missing).walk(&mut rec).unwrap_err();

        assert_eq!(err.code(), "PYS-2002");
        assert!(rec.visited.is_empty());
    }

    #[test]
    fn root_that_is_a_file_is_a_traversal_error() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("plain.txt");
        fs::write(&file, "x").unwrap();

        let err = TopDownWalker::new(&file)
            .walk(&mut Recorder::default())
            .unwrap_err();
        assert!(matches!(err, SweepError::Traversal { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn symlinked_directories_are_listed_as_files() {
        let dir = tree();
        let root = dir.path();
        std::os::unix::fs::symlink(root.join("b"), root.join("link")).unwrap();
        let mut rec = Recorder::default();

        TopDownWalker::new(root).walk(&mut rec).unwrap();

        assert!(!rec.visited.contains(&root.join("link")));
        assert!(!rec.visited.contains(&root.join("link/inner")));
    }
}
