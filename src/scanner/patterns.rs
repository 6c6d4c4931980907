//! Artifact patterns: which directory and file names are Python bytecode caches.
//!
//! Both matchers work on raw encoded bytes so names that are not valid UTF-8
//! are still classified by their ASCII suffix.

use std::ffi::OsStr;

use serde::Serialize;

/// Directory name CPython writes compiled modules into.
pub const CACHE_DIR_NAME: &str = "__pycache__";

/// File suffixes of compiled bytecode. Matched case-sensitively.
pub const BYTECODE_SUFFIXES: [&str; 2] = [".pyc", ".pyo"];

/// What kind of artifact a removal target is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    /// A whole `__pycache__` subtree, removed recursively.
    CacheDir,
    /// A single `.pyc`/`.pyo` file.
    BytecodeFile,
}

impl ArtifactKind {
    /// Label used in log messages ("Removed directory: ...").
    pub const fn label(self) -> &'static str {
        match self {
            Self::CacheDir => "directory",
            Self::BytecodeFile => "file",
        }
    }
}

/// Exact, case-sensitive match on the cache directory name.
pub fn is_cache_dir_name(name: &OsStr) -> bool {
    name == CACHE_DIR_NAME
}

/// Suffix match against [`BYTECODE_SUFFIXES`].
pub fn is_bytecode_file_name(name: &OsStr) -> bool {
    let bytes = name.as_encoded_bytes();
    BYTECODE_SUFFIXES
        .iter()
        .any(|suffix| bytes.ends_with(suffix.as_bytes()))
}
