//! PYS-prefixed error types with structured error codes.

#![allow(missing_docs)]

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Shared `Result` alias for the project.
pub type Result<T> = std::result::Result<T, SweepError>;

/// Top-level error type for the sweeper.
///
/// Deletion and traversal failures are recovered inside a sweep and only
/// surface as [`SweepFailure`](crate::scanner::sweeper::SweepFailure) records;
/// the remaining variants reach the caller.
#[derive(Debug, Error)]
pub enum SweepError {
    #[error("[PYS-1001] invalid configuration: {details}")]
    InvalidConfig { details: String },

    #[error("[PYS-1002] missing configuration file: {path}")]
    MissingConfig { path: PathBuf },

    #[error("[PYS-1003] configuration parse failure in {context}: {details}")]
    ConfigParse {
        context: &'static str,
        details: String,
    },

    #[error("[PYS-2001] failed to remove {path}: {source}")]
    Deletion {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("[PYS-2002] error walking directory {root}: {source}")]
    Traversal {
        root: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("[PYS-2101] serialization failure in {context}: {details}")]
    Serialization {
        context: &'static str,
        details: String,
    },

    #[error("[PYS-3002] IO failure at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("[PYS-3100] interrupted by user")]
    Interrupted,

    #[error("[PYS-3900] unexpected failure: {details}")]
    Unexpected { details: String },
}

impl SweepError {
    /// Stable machine-parseable error code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::InvalidConfig { .. } => "PYS-1001",
            Self::MissingConfig { .. } => "PYS-1002",
            Self::ConfigParse { .. } => "PYS-1003",
            Self::Deletion { .. } => "PYS-2001",
            Self::Traversal { .. } => "PYS-2002",
            Self::Serialization { .. } => "PYS-2101",
            Self::Io { .. } => "PYS-3002",
            Self::Interrupted => "PYS-3100",
            Self::Unexpected { .. } => "PYS-3900",
        }
    }

    /// Whether running the sweep again might resolve the failure.
    ///
    /// A locked file or a path that vanished mid-walk can clear up on its own;
    /// a permission denial or a bad config will not.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Deletion { source, .. }
            | Self::Traversal { source, .. }
            | Self::Io { source, .. } => {
                source.kind() != std::io::ErrorKind::PermissionDenied
            }
            Self::Interrupted | Self::Unexpected { .. } => true,
            Self::InvalidConfig { .. }
            | Self::MissingConfig { .. }
            | Self::ConfigParse { .. }
            | Self::Serialization { .. } => false,
        }
    }

    /// Convenience constructor for IO errors with a known path.
    #[must_use]
    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    /// Convenience constructor for a failed removal.
    #[must_use]
    pub fn deletion(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::Deletion {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }
}

impl From<serde_json::Error> for SweepError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serialization {
            context: "serde_json",
            details: value.to_string(),
        }
    }
}

impl From<toml::de::Error> for SweepError {
    fn from(value: toml::de::Error) -> Self {
        Self::ConfigParse {
            context: "toml",
            details: value.to_string(),
        }
    }
}

impl From<toml::ser::Error> for SweepError {
    fn from(value: toml::ser::Error) -> Self {
        Self::Serialization {
            context: "toml",
            details: value.to_string(),
        }
    }
}
