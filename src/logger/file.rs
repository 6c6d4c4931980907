//! Append-only log file writer with size-based rotation and graceful degradation.
//!
//! Each record becomes exactly one line, assembled in memory and written with a
//! single `write_all` so a tailing reader never sees a partial line.
//!
//! Degradation chain:
//! 1. Primary file path
//! 2. Fallback path (if configured)
//! 3. stderr with `[PYS-LOG]` prefix
//! 4. Silent discard (a sweep must never fail because logging failed)

#![allow(missing_docs)]

use std::fs::{self, File, OpenOptions, rename};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::core::errors::{Result, SweepError};
use crate::logger::record::{Level, LogRecord};
use crate::logger::sink::EventSink;

/// On-disk line format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// `ts - LEVEL - message`
    #[default]
    Text,
    /// One JSON object per line.
    Jsonl,
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(raw: &str) -> std::result::Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "jsonl" | "json" => Ok(Self::Jsonl),
            other => Err(format!("unknown log format {other:?} (expected text or jsonl)")),
        }
    }
}

/// Degradation state of the writer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WriterState {
    Normal,
    Fallback,
    Stderr,
    Discard,
}

/// Configuration for the file writer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogFileConfig {
    pub path: PathBuf,
    pub fallback_path: Option<PathBuf>,
    pub format: LogFormat,
    /// Maximum file size before rotation (bytes).
    pub max_size_bytes: u64,
    /// Number of rotated files to keep.
    pub max_rotated_files: u32,
    /// Records below this level are not written.
    pub min_level: Level,
}

impl Default for LogFileConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("pycache_cleanup.log"),
            fallback_path: None,
            format: LogFormat::Text,
            max_size_bytes: 10 * 1024 * 1024,
            max_rotated_files: 3,
            min_level: Level::Info,
        }
    }
}

/// Line writer behind [`FileSink`].
pub struct LogFileWriter {
    config: LogFileConfig,
    writer: Option<BufWriter<File>>,
    state: WriterState,
    bytes_written: u64,
}

impl LogFileWriter {
    /// Open the log file. Falls through the degradation chain on failure.
    pub fn open(config: LogFileConfig) -> Self {
        let mut w = Self {
            config,
            writer: None,
            state: WriterState::Discard,
            bytes_written: 0,
        };
        w.try_open_primary();
        w
    }

    /// Write a single record as one line and flush it.
    pub fn write_record(&mut self, record: &LogRecord) {
        if record.level < self.config.min_level {
            return;
        }
        let line = match self.config.format {
            LogFormat::Text => format!("{}\n", record.to_text_line()),
            LogFormat::Jsonl => match serde_json::to_string(record) {
                Ok(json) => format!("{json}\n"),
                Err(e) => {
                    let _ = writeln!(io::stderr(), "[PYS-LOG] serialize error: {e}");
                    return;
                }
            },
        };
        self.write_line(&line);
    }

    pub fn flush(&mut self) {
        if let Some(w) = self.writer.as_mut() {
            let _ = w.flush();
        }
    }

    /// Current degradation state.
    pub fn state(&self) -> &'static str {
        match self.state {
            WriterState::Normal => "normal",
            WriterState::Fallback => "fallback",
            WriterState::Stderr => "stderr",
            WriterState::Discard => "discard",
        }
    }

    /// Path records are currently going to, if a file is open.
    pub fn active_path(&self) -> Option<&Path> {
        match self.state {
            WriterState::Normal => Some(&self.config.path),
            WriterState::Fallback => self.config.fallback_path.as_deref(),
            WriterState::Stderr | WriterState::Discard => None,
        }
    }

    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    // ──────────────────────── internals ────────────────────────

    fn write_line(&mut self, line: &str) {
        if self.bytes_written + line.len() as u64 > self.config.max_size_bytes
            && matches!(self.state, WriterState::Normal | WriterState::Fallback)
        {
            self.rotate();
        }

        match self.state {
            WriterState::Normal | WriterState::Fallback => {
                if let Some(w) = self.writer.as_mut() {
                    if w.write_all(line.as_bytes()).and_then(|()| w.flush()).is_err() {
                        self.degrade();
                        self.write_line(line);
                        return;
                    }
                    self.bytes_written += line.len() as u64;
                } else {
                    self.degrade();
                    self.write_line(line);
                }
            }
            WriterState::Stderr => {
                let _ = write!(io::stderr(), "[PYS-LOG] {line}");
            }
            WriterState::Discard => {}
        }
    }

    fn try_open_primary(&mut self) {
        match open_append(&self.config.path) {
            Ok((file, size)) => {
                self.writer = Some(BufWriter::new(file));
                self.state = WriterState::Normal;
                self.bytes_written = size;
            }
            Err(_) => self.try_open_fallback(),
        }
    }

    fn try_open_fallback(&mut self) {
        let Some(fb) = self.config.fallback_path.clone() else {
            self.state = WriterState::Stderr;
            let _ = writeln!(
                io::stderr(),
                "[PYS-LOG] cannot open {}, logging to stderr",
                self.config.path.display()
            );
            return;
        };
        match open_append(&fb) {
            Ok((file, size)) => {
                let _ = writeln!(
                    io::stderr(),
                    "[PYS-LOG] primary log path failed, using fallback: {}",
                    fb.display()
                );
                self.writer = Some(BufWriter::new(file));
                self.state = WriterState::Fallback;
                self.bytes_written = size;
            }
            Err(_) => {
                self.state = WriterState::Stderr;
                let _ = writeln!(
                    io::stderr(),
                    "[PYS-LOG] primary and fallback log paths failed, logging to stderr"
                );
            }
        }
    }

    fn degrade(&mut self) {
        self.writer = None;
        match self.state {
            WriterState::Normal => self.try_open_fallback(),
            WriterState::Fallback => {
                self.state = WriterState::Stderr;
                let _ = writeln!(io::stderr(), "[PYS-LOG] fallback write failed, using stderr");
            }
            WriterState::Stderr => self.state = WriterState::Discard,
            WriterState::Discard => {}
        }
    }

    fn rotate(&mut self) {
        self.flush();
        self.writer = None;

        let base = match self.state {
            WriterState::Normal => self.config.path.clone(),
            WriterState::Fallback => match &self.config.fallback_path {
                Some(p) => p.clone(),
                None => return,
            },
            _ => return,
        };

        if self.config.max_rotated_files == 0 {
            let _ = fs::remove_file(&base);
        } else {
            // Drop the oldest, then shift: .1→.2, current→.1
            let _ = fs::remove_file(rotated_name(&base, self.config.max_rotated_files));
            for i in (1..self.config.max_rotated_files).rev() {
                let _ = rename(rotated_name(&base, i), rotated_name(&base, i + 1));
            }
            let _ = rename(&base, rotated_name(&base, 1));
        }

        match open_append(&base) {
            Ok((file, _)) => {
                self.writer = Some(BufWriter::new(file));
                self.bytes_written = 0;
            }
            Err(_) => self.degrade(),
        }
    }
}

impl std::fmt::Debug for LogFileWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogFileWriter")
            .field("config", &self.config)
            .field("state", &self.state)
            .field("bytes_written", &self.bytes_written)
            .finish_non_exhaustive()
    }
}

/// [`EventSink`] over a [`LogFileWriter`].
#[derive(Debug)]
pub struct FileSink {
    writer: Mutex<LogFileWriter>,
}

impl FileSink {
    pub fn open(config: LogFileConfig) -> Self {
        Self {
            writer: Mutex::new(LogFileWriter::open(config)),
        }
    }

    pub fn state(&self) -> &'static str {
        self.writer.lock().state()
    }

    /// Path records are currently going to, if a file is open.
    pub fn active_path(&self) -> Option<PathBuf> {
        self.writer.lock().active_path().map(Path::to_path_buf)
    }
}

impl EventSink for FileSink {
    fn emit(&self, record: &LogRecord) {
        self.writer.lock().write_record(record);
    }

    fn flush(&self) {
        self.writer.lock().flush();
    }
}

// ──────────────────────── helpers ────────────────────────

/// Open or create a file for appending. Returns `(File, current_size)`.
fn open_append(path: &Path) -> Result<(File, u64)> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).map_err(|source| SweepError::io(parent, source))?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|source| SweepError::io(path, source))?;
    let size = file.metadata().map(|m| m.len()).unwrap_or(0);
    Ok((file, size))
}

/// Build a rotated filename: `sweep.log` → `sweep.log.3`.
fn rotated_name(base: &Path, index: u32) -> PathBuf {
    let mut name = base.as_os_str().to_owned();
    name.push(format!(".{index}"));
    PathBuf::from(name)
}
