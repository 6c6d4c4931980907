//! Event sinks: the append-only `emit` capability handed to the sweeper.
//!
//! Nothing in the crate installs a global logger. Every component that logs
//! takes a `&dyn EventSink`, so tests can capture events with a
//! [`MemorySink`] and the CLI can tee to a file and the console.

#![allow(missing_docs)]

use std::io::{self, Write};

use parking_lot::Mutex;

use crate::logger::record::{EventType, Level, LogRecord};

/// Append-only destination for log records.
pub trait EventSink {
    /// Record one event. Sinks never fail: a sink that cannot write degrades
    /// or drops the record, it does not interrupt the sweep.
    fn emit(&self, record: &LogRecord);

    /// Flush buffered output, if any.
    fn flush(&self) {}
}

impl<S: EventSink + ?Sized> EventSink for &S {
    fn emit(&self, record: &LogRecord) {
        (**self).emit(record);
    }

    fn flush(&self) {
        (**self).flush();
    }
}

impl<S: EventSink + ?Sized> EventSink for Box<S> {
    fn emit(&self, record: &LogRecord) {
        (**self).emit(record);
    }

    fn flush(&self) {
        (**self).flush();
    }
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl EventSink for NullSink {
    fn emit(&self, _record: &LogRecord) {}
}

/// Keeps every record in memory, in order.
#[derive(Debug, Default)]
pub struct MemorySink {
    records: Mutex<Vec<LogRecord>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all records emitted so far.
    pub fn records(&self) -> Vec<LogRecord> {
        self.records.lock().clone()
    }

    pub fn messages(&self) -> Vec<String> {
        self.records.lock().iter().map(|r| r.message.clone()).collect()
    }

    /// Records of one event type.
    pub fn of(&self, event: EventType) -> Vec<LogRecord> {
        self.records
            .lock()
            .iter()
            .filter(|r| r.event == event)
            .cloned()
            .collect()
    }

    pub fn count(&self, event: EventType) -> usize {
        self.records.lock().iter().filter(|r| r.event == event).count()
    }
}

impl EventSink for MemorySink {
    fn emit(&self, record: &LogRecord) {
        self.records.lock().push(record.clone());
    }
}

/// Writes text lines to stderr for records at or above `min_level`.
#[derive(Debug, Clone, Copy)]
pub struct ConsoleSink {
    min_level: Level,
}

impl ConsoleSink {
    pub const fn new(min_level: Level) -> Self {
        Self { min_level }
    }

    pub const fn min_level(&self) -> Level {
        self.min_level
    }
}

impl Default for ConsoleSink {
    fn default() -> Self {
        Self::new(Level::Info)
    }
}

impl EventSink for ConsoleSink {
    fn emit(&self, record: &LogRecord) {
        if record.level < self.min_level {
            return;
        }
        let mut stderr = io::stderr().lock();
        for line in record.to_text_line().lines() {
            let _ = writeln!(stderr, "{line}");
        }
    }

    fn flush(&self) {
        let _ = io::stderr().flush();
    }
}

/// Forwards every record to each inner sink in order.
#[derive(Default)]
pub struct TeeSink {
    sinks: Vec<Box<dyn EventSink + Send + Sync>>,
}

impl TeeSink {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(mut self, sink: impl EventSink + Send + Sync + 'static) -> Self {
        self.sinks.push(Box::new(sink));
        self
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}

impl EventSink for TeeSink {
    fn emit(&self, record: &LogRecord) {
        for sink in &self.sinks {
            sink.emit(record);
        }
    }

    fn flush(&self) {
        for sink in &self.sinks {
            sink.flush();
        }
    }
}

impl std::fmt::Debug for TeeSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TeeSink")
            .field("sinks", &self.sinks.len())
            .finish()
    }
}
