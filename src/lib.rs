#![forbid(unsafe_code)]

//! pycache_sweeper: removes Python bytecode caches (`__pycache__` directories,
//! `.pyc` and `.pyo` files) from directory trees, refusing to touch any path
//! that looks like a system location.
//!
//! The pieces:
//! 1. **Safety filter** ([`scanner::protection`]): pure substring denylist over
//!    the full candidate path, case-insensitive.
//! 2. **Sweeper** ([`scanner::sweeper`]): top-down walk of one root; removes safe
//!    candidates, prunes removed cache directories, tallies removals and errors.
//! 3. **Orchestrator** ([`orchestrator`]): one sweep per root, totals, interrupts.
//!
//! Logging is an injected [`logger::sink::EventSink`]; nothing installs a global logger.
//!
//! # Library usage
//!
//! ```rust,no_run
//! use pycache_sweeper::prelude::*;
//!
//! let sink = MemorySink::new();
//! let report = CacheSweeper::new(&sink).sweep(std::path::Path::new("/srv/app"));
//! println!("removed {} errors {}", report.removed, report.errors);
//! ```

pub mod prelude;

pub mod core;
pub mod logger;
pub mod orchestrator;
pub mod scanner;
