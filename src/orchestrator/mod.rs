//! Multi-root orchestration: one sweep per root, totals across the run.

#![allow(missing_docs)]

#[cfg(feature = "signals")]
pub mod signals;

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use serde::Serialize;

use crate::logger::record::{EventType, Level, LogRecord};
use crate::logger::sink::EventSink;
use crate::scanner::sweeper::{CacheSweeper, FsRemover, Remover, SweepReport};

/// Outcome of a whole run across every configured root.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunSummary {
    /// One report per swept root, in sweep order.
    pub reports: Vec<SweepReport>,
    /// Roots that did not exist when their turn came.
    pub skipped_roots: Vec<PathBuf>,
    pub total_removed: u64,
    pub total_errors: u64,
    pub total_skipped_unsafe: u64,
    #[serde(rename = "elapsed_secs", serialize_with = "serialize_secs")]
    pub elapsed: Duration,
    /// The run stopped early; totals cover the work done before the stop.
    pub interrupted: bool,
}

impl RunSummary {
    /// `(total_removed, total_errors)`.
    #[must_use]
    pub const fn counts(&self) -> (u64, u64) {
        (self.total_removed, self.total_errors)
    }

    fn absorb(&mut self, report: SweepReport) {
        self.total_removed += report.removed;
        self.total_errors += report.errors;
        self.total_skipped_unsafe += report.skipped_unsafe;
        self.interrupted |= report.interrupted;
        self.reports.push(report);
    }
}

fn serialize_secs<S: serde::Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(value.as_secs_f64())
}

/// Runs the sweeper over a list of roots, sequentially.
pub struct Orchestrator<'a> {
    sink: &'a dyn EventSink,
    remover: &'a dyn Remover,
    cancel: Option<&'a dyn Fn() -> bool>,
}

impl<'a> Orchestrator<'a> {
    pub fn new(sink: &'a dyn EventSink) -> Self {
        Self {
            sink,
            remover: &FsRemover,
            cancel: None,
        }
    }

    #[must_use]
    pub fn with_remover(mut self, remover: &'a dyn Remover) -> Self {
        self.remover = remover;
        self
    }

    /// Stop the run once `check` returns `true`. Polled before each root and
    /// inside each sweep before each directory.
    #[must_use]
    pub fn with_cancel_check(mut self, check: &'a dyn Fn() -> bool) -> Self {
        self.cancel = Some(check);
        self
    }

    /// Sweep every root in order. Missing roots are skipped with a warning
    /// and contribute nothing to the totals.
    pub fn run(&self, roots: &[PathBuf]) -> RunSummary {
        let start = Instant::now();
        let mut summary = RunSummary::default();
        self.sink.emit(&LogRecord::new(
            EventType::RunStarted,
            Level::Info,
            format!("Starting pycache cleanup across {} root(s)", roots.len()),
        ));

        let mut sweeper = CacheSweeper::new(self.sink).with_remover(self.remover);
        if let Some(check) = self.cancel {
            sweeper = sweeper.with_cancel_check(check);
        }

        for root in roots {
            if self.cancelled() {
                summary.interrupted = true;
                break;
            }
            if !root_exists(root) {
                self.sink.emit(
                    &LogRecord::new(
                        EventType::RootSkipped,
                        Level::Warning,
                        format!(
                            "Drive/Root {} does not exist or is not accessible",
                            root.display()
                        ),
                    )
                    .with_root(root),
                );
                summary.skipped_roots.push(root.clone());
                continue;
            }

            summary.absorb(sweeper.sweep(root));
            if summary.interrupted {
                break;
            }
        }

        summary.elapsed = start.elapsed();
        if summary.interrupted {
            self.sink.emit(
                &LogRecord::new(
                    EventType::Interrupted,
                    Level::Warning,
                    "Cleanup interrupted by user",
                )
                .with_counts(summary.total_removed, summary.total_errors),
            );
        }
        self.sink.emit(
            &LogRecord::new(
                EventType::RunCompleted,
                Level::Info,
                format!(
                    "Total items removed: {}. Total errors: {}",
                    summary.total_removed, summary.total_errors
                ),
            )
            .with_counts(summary.total_removed, summary.total_errors)
            .with_elapsed(summary.elapsed),
        );
        summary
    }

    fn cancelled(&self) -> bool {
        self.cancel.is_some_and(|check| check())
    }
}

impl std::fmt::Debug for Orchestrator<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("cancellable", &self.cancel.is_some())
            .finish_non_exhaustive()
    }
}

fn root_exists(root: &Path) -> bool {
    root.try_exists().unwrap_or(false)
}
