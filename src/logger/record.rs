//! Structured log records: one self-contained event per line.

#![allow(missing_docs)]

use std::fmt;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Severity level for log events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Debug,
    Info,
    Warning,
    Error,
}

impl Level {
    /// Upper-case name used in text lines (`INFO`, `WARNING`, ...).
    pub const fn as_upper(self) -> &'static str {
        match self {
            Self::Debug => "DEBUG",
            Self::Info => "INFO",
            Self::Warning => "WARNING",
            Self::Error => "ERROR",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_upper())
    }
}

/// Event types emitted over a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    RunStarted,
    SweepStarted,
    Removed,
    RemovalFailed,
    SkippedUnsafe,
    DirectoryUnreadable,
    TraversalFailed,
    SweepCompleted,
    RootSkipped,
    RunCompleted,
    Interrupted,
    UnexpectedFailure,
}

/// A single log record. `ts`, `level`, `event` and `message` are always set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogRecord {
    /// ISO 8601 UTC timestamp.
    pub ts: String,
    pub level: Level,
    pub event: EventType,
    /// Human-readable line, also used verbatim by the text format.
    pub message: String,
    /// Root being swept, when the event belongs to one sweep.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub root: Option<String>,
    /// Affected filesystem path.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub removed: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub elapsed_secs: Option<f64>,
    /// PYS error code when the event reports a failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
}

impl LogRecord {
    /// Create a record stamped with the current UTC time.
    pub fn new(event: EventType, level: Level, message: impl Into<String>) -> Self {
        Self {
            ts: format_utc_now(),
            level,
            event,
            message: message.into(),
            root: None,
            path: None,
            removed: None,
            errors: None,
            elapsed_secs: None,
            error_code: None,
        }
    }

    #[must_use]
    pub fn with_root(mut self, root: &Path) -> Self {
        self.root = Some(root.to_string_lossy().into_owned());
        self
    }

    #[must_use]
    pub fn with_path(mut self, path: &Path) -> Self {
        self.path = Some(path.to_string_lossy().into_owned());
        self
    }

    #[must_use]
    pub fn with_counts(mut self, removed: u64, errors: u64) -> Self {
        self.removed = Some(removed);
        self.errors = Some(errors);
        self
    }

    #[must_use]
    pub fn with_elapsed(mut self, elapsed: Duration) -> Self {
        self.elapsed_secs = Some(elapsed.as_secs_f64());
        self
    }

    #[must_use]
    pub fn with_error_code(mut self, code: &str) -> Self {
        self.error_code = Some(code.to_string());
        self
    }

    /// `2026-10-17T09:15:02.118Z - INFO - Removed file: /srv/app/m.pyc`
    pub fn to_text_line(&self) -> String {
        format!("{} - {} - {}", self.ts, self.level, self.message)
    }
}

/// Format current UTC time as ISO 8601.
fn format_utc_now() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}
