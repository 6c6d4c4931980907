//! Cache sweeper: top-down walk of one root with guarded removal of bytecode caches.
//!
//! Per visited directory:
//! 1. A safe `__pycache__` child is removed recursively and pruned from the
//!    walk, whether or not the removal worked.
//! 2. Every safe `.pyc`/`.pyo` file child is removed.
//!
//! A candidate that fails the safety filter is skipped without touching either
//! counter, and an unsafe `__pycache__` is still descended into.
//!
//! Failures never escape a sweep. A failed removal is counted and logged. A
//! root that cannot be listed ends the sweep with one error.

#![allow(missing_docs)]

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use serde::{Serialize, Serializer};

use crate::core::errors::SweepError;
use crate::logger::record::{EventType, Level, LogRecord};
use crate::logger::sink::EventSink;
use crate::scanner::patterns::{self, ArtifactKind, CACHE_DIR_NAME};
use crate::scanner::protection::{self, SafetyDecision};
use crate::scanner::walker::{Descent, DirVisit, DirVisitor, TopDownWalker, WalkOutcome};

// ──────────────────── removal seam ────────────────────

/// Filesystem removal operations used by the sweeper.
pub trait Remover {
    /// Remove a directory and everything beneath it.
    fn remove_dir_all(&self, path: &Path) -> io::Result<()>;
    /// Remove a single file (or symlink).
    fn remove_file(&self, path: &Path) -> io::Result<()>;
}

/// Removes through `std::fs`.
#[derive(Debug, Default, Clone, Copy)]
pub struct FsRemover;

impl Remover for FsRemover {
    fn remove_dir_all(&self, path: &Path) -> io::Result<()> {
        fs::remove_dir_all(path)
    }

    fn remove_file(&self, path: &Path) -> io::Result<()> {
        fs::remove_file(path)
    }
}

// ──────────────────── report types ────────────────────

/// Which tier a failure belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// One file or cache directory could not be removed; the sweep went on.
    Deletion,
    /// The root could not be walked; the sweep ended early.
    Traversal,
}

/// A single failure record.
#[derive(Debug, Clone, Serialize)]
pub struct SweepFailure {
    pub path: PathBuf,
    pub kind: FailureKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artifact: Option<ArtifactKind>,
    pub error_code: String,
    pub error: String,
    pub retryable: bool,
}

impl SweepFailure {
    fn from_error(err: &SweepError, kind: FailureKind, artifact: Option<ArtifactKind>) -> Self {
        let path = match err {
            SweepError::Deletion { path, .. } | SweepError::Io { path, .. } => path.clone(),
            SweepError::Traversal { root, .. } => root.clone(),
            _ => PathBuf::new(),
        };
        Self {
            path,
            kind,
            artifact,
            error_code: err.code().to_string(),
            error: err.to_string(),
            retryable: err.is_retryable(),
        }
    }
}

/// Outcome of sweeping one root.
#[derive(Debug, Clone, Serialize)]
pub struct SweepReport {
    pub root: PathBuf,
    /// Successful removals. A `__pycache__` subtree counts once.
    pub removed: u64,
    /// Failed removals, plus one if the root could not be walked.
    pub errors: u64,
    /// Candidates refused by the safety filter. Informational only.
    pub skipped_unsafe: u64,
    pub directories_visited: usize,
    pub failures: Vec<SweepFailure>,
    #[serde(rename = "elapsed_secs", serialize_with = "serialize_secs")]
    pub elapsed: Duration,
    /// The cancel check fired before the walk finished.
    pub interrupted: bool,
}

impl SweepReport {
    fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
            removed: 0,
            errors: 0,
            skipped_unsafe: 0,
            directories_visited: 0,
            failures: Vec::new(),
            elapsed: Duration::ZERO,
            interrupted: false,
        }
    }

    /// `(removed, errors)`, the pair the orchestrator sums.
    pub const fn counts(&self) -> (u64, u64) {
        (self.removed, self.errors)
    }

    /// Failures of one tier.
    pub fn failures_of(&self, kind: FailureKind) -> impl Iterator<Item = &SweepFailure> {
        self.failures.iter().filter(move |f| f.kind == kind)
    }
}

fn serialize_secs<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(value.as_secs_f64())
}

// ──────────────────── sweeper ────────────────────

/// Sweeps one root at a time. Holds no state between sweeps.
pub struct CacheSweeper<'a> {
    sink: &'a dyn EventSink,
    remover: &'a dyn Remover,
    cancel: Option<&'a dyn Fn() -> bool>,
}

impl<'a> CacheSweeper<'a> {
    /// Sweeper that deletes through `std::fs` and logs to `sink`.
    pub fn new(sink: &'a dyn EventSink) -> Self {
        Self {
            sink,
            remover: &FsRemover,
            cancel: None,
        }
    }

    /// Replace the filesystem removal backend.
    #[must_use]
    pub fn with_remover(mut self, remover: &'a dyn Remover) -> Self {
        self.remover = remover;
        self
    }

    /// Poll `check` before each directory; when it returns `true` the sweep
    /// stops and reports what it accumulated so far.
    #[must_use]
    pub fn with_cancel_check(mut self, check: &'a dyn Fn() -> bool) -> Self {
        self.cancel = Some(check);
        self
    }

    /// Sweep `root` and return its report. Never fails.
    pub fn sweep(&self, root: &Path) -> SweepReport {
        let start = Instant::now();
        self.sink.emit(
            &LogRecord::new(
                EventType::SweepStarted,
                Level::Info,
                format!("Starting cleanup in {}", root.display()),
            )
            .with_root(root),
        );

        let mut pass = SweepPass {
            sweeper: self,
            report: SweepReport::new(root),
        };

        match TopDownWalker::new(root).walk(&mut pass) {
            Ok(WalkOutcome::Completed { directories }) => {
                pass.report.directories_visited = directories;
            }
            Ok(WalkOutcome::Stopped { directories }) => {
                pass.report.directories_visited = directories;
                pass.report.interrupted = true;
                self.sink.emit(
                    &LogRecord::new(
                        EventType::Interrupted,
                        Level::Warning,
                        format!("Cleanup in {} interrupted", root.display()),
                    )
                    .with_root(root),
                );
            }
            Err(err) => pass.record_traversal_failure(root, &err),
        }

        let mut report = pass.report;
        report.elapsed = start.elapsed();
        self.sink.emit(
            &LogRecord::new(
                EventType::SweepCompleted,
                Level::Info,
                format!(
                    "Cleanup in {} completed. Removed {} items. Errors: {}. Time: {:.2} seconds",
                    root.display(),
                    report.removed,
                    report.errors,
                    report.elapsed.as_secs_f64()
                ),
            )
            .with_root(root)
            .with_counts(report.removed, report.errors)
            .with_elapsed(report.elapsed),
        );
        report
    }

    fn cancelled(&self) -> bool {
        self.cancel.is_some_and(|check| check())
    }
}

impl std::fmt::Debug for CacheSweeper<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheSweeper")
            .field("cancellable", &self.cancel.is_some())
            .finish_non_exhaustive()
    }
}

/// Mutable state of one sweep, driven by the walker.
struct SweepPass<'s, 'a> {
    sweeper: &'s CacheSweeper<'a>,
    report: SweepReport,
}

impl SweepPass<'_, '_> {
    /// Returns `true` when the candidate was safe and a removal was attempted.
    fn try_remove(&mut self, path: &Path, kind: ArtifactKind) -> bool {
        if let SafetyDecision::Denied { term } = protection::check(path) {
            self.report.skipped_unsafe += 1;
            self.emit(
                LogRecord::new(
                    EventType::SkippedUnsafe,
                    Level::Debug,
                    format!("Skipped protected path {} (matches {term:?})", path.display()),
                )
                .with_path(path),
            );
            return false;
        }

        let remover = self.sweeper.remover;
        let result = match kind {
            ArtifactKind::CacheDir => remover.remove_dir_all(path),
            ArtifactKind::BytecodeFile => remover.remove_file(path),
        };

        match result {
            Ok(()) => {
                self.report.removed += 1;
                self.emit(
                    LogRecord::new(
                        EventType::Removed,
                        Level::Info,
                        format!("Removed {}: {}", kind.label(), path.display()),
                    )
                    .with_path(path),
                );
            }
            Err(source) => {
                let message = format!("Failed to remove {}: {source}", path.display());
                let err = SweepError::deletion(path, source);
                self.report.errors += 1;
                self.report.failures.push(SweepFailure::from_error(
                    &err,
                    FailureKind::Deletion,
                    Some(kind),
                ));
                self.emit(
                    LogRecord::new(EventType::RemovalFailed, Level::Error, message)
                        .with_path(path)
                        .with_error_code(err.code()),
                );
            }
        }
        true
    }

    fn record_traversal_failure(&mut self, root: &Path, err: &SweepError) {
        let cause = match err {
            SweepError::Traversal { source, .. } => source.to_string(),
            other => other.to_string(),
        };
        self.report.errors += 1;
        self.report
            .failures
            .push(SweepFailure::from_error(err, FailureKind::Traversal, None));
        self.emit(
            LogRecord::new(
                EventType::TraversalFailed,
                Level::Error,
                format!("Error walking directory {}: {cause}", root.display()),
            )
            .with_root(root)
            .with_error_code(err.code()),
        );
    }

    fn emit(&self, record: LogRecord) {
        self.sweeper.sink.emit(&record);
    }
}

impl DirVisitor for SweepPass<'_, '_> {
    fn visit(&mut self, visit: &DirVisit) -> Descent {
        if self.sweeper.cancelled() {
            return Descent::stop();
        }

        let mut descent = Descent::descend_all();

        if visit.subdirs.iter().any(|name| patterns::is_cache_dir_name(name)) {
            let cache_dir = visit.dir.join(CACHE_DIR_NAME);
            if self.try_remove(&cache_dir, ArtifactKind::CacheDir) {
                descent.prune(CACHE_DIR_NAME);
            }
        }

        for name in &visit.files {
            if patterns::is_bytecode_file_name(name) {
                let file = visit.dir.join(name);
                self.try_remove(&file, ArtifactKind::BytecodeFile);
            }
        }

        descent
    }

    fn unreadable(&mut self, dir: &Path, error: &io::Error) {
        self.emit(
            LogRecord::new(
                EventType::DirectoryUnreadable,
                Level::Warning,
                format!("Cannot read directory {}: {error}", dir.display()),
            )
            .with_path(dir),
        );
    }
}

// ──────────────────── tests ────────────────────
