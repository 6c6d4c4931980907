//! Convenience re-exports for library consumers.
//!
//! ```rust,no_run
//! use pycache_sweeper::prelude::*;
//! ```

// Core
pub use crate::core::config::Config;
pub use crate::core::errors::{Result, SweepError};

// Logger
pub use crate::logger::file::{FileSink, LogFileConfig, LogFormat};
pub use crate::logger::record::{EventType, Level, LogRecord};
pub use crate::logger::sink::{ConsoleSink, EventSink, MemorySink, NullSink, TeeSink};

// Scanner
pub use crate::scanner::protection::{SafetyDecision, is_safe};
pub use crate::scanner::sweeper::{CacheSweeper, FsRemover, Remover, SweepFailure, SweepReport};
pub use crate::scanner::walker::{Descent, DirVisit, DirVisitor, TopDownWalker};

// Orchestrator
pub use crate::orchestrator::{Orchestrator, RunSummary};
