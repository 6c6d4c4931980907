//! Structured event logging: records, sinks, and the rotating log file.

pub mod file;
pub mod record;
pub mod sink;
