//! Configuration system: TOML file + env var overrides + smart defaults.
//!
//! Only the surroundings of a sweep are configurable (roots and logging).
//! The path denylist and the artifact names are fixed.

#![allow(missing_docs)]

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::core::errors::{Result, SweepError};
use crate::logger::file::{LogFileConfig, LogFormat};
use crate::logger::record::Level;

/// Full configuration model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(default)]
pub struct Config {
    pub sweep: SweepConfig,
    pub logging: LoggingConfig,
    pub paths: PathsConfig,
}

/// Which roots to sweep.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SweepConfig {
    /// Roots swept when none are given on the command line.
    pub root_paths: Vec<PathBuf>,
}

/// Log sink settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LoggingConfig {
    /// Write records to `file`.
    pub file_enabled: bool,
    /// Log file; relative paths resolve against the working directory.
    pub file: PathBuf,
    /// Used when `file` cannot be opened.
    pub fallback_file: Option<PathBuf>,
    pub format: LogFormat,
    pub file_level: Level,
    /// Mirror records to stderr.
    pub console: bool,
    pub console_level: Level,
    pub max_size_bytes: u64,
    pub max_rotated_files: u32,
}

/// Filesystem paths used by the tool itself.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PathsConfig {
    pub config_file: PathBuf,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            root_paths: default_roots(),
        }
    }
}

/// Every drive letter the cleanup historically covered, or the filesystem root.
fn default_roots() -> Vec<PathBuf> {
    if cfg!(windows) {
        vec![PathBuf::from("C:\\"), PathBuf::from("D:\\")]
    } else {
        vec![PathBuf::from("/")]
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            file_enabled: true,
            file: PathBuf::from("pycache_cleanup.log"),
            fallback_file: Some(env::temp_dir().join("pycache_cleanup.log")),
            format: LogFormat::Text,
            file_level: Level::Info,
            console: true,
            console_level: Level::Info,
            max_size_bytes: 10 * 1024 * 1024,
            max_rotated_files: 3,
        }
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        let home_dir = env::var_os("HOME")
            .or_else(|| env::var_os("USERPROFILE"))
            .map_or_else(
                || {
                    eprintln!(
                        "[PYS-CONFIG] WARNING: HOME not set, falling back to the temp dir for config"
                    );
                    env::temp_dir()
                },
                PathBuf::from,
            );
        Self {
            config_file: home_dir.join(".config").join("pysweep").join("config.toml"),
        }
    }
}

impl LoggingConfig {
    /// Settings for the file sink.
    pub fn file_config(&self) -> LogFileConfig {
        LogFileConfig {
            path: self.file.clone(),
            fallback_path: self.fallback_file.clone(),
            format: self.format,
            max_size_bytes: self.max_size_bytes,
            max_rotated_files: self.max_rotated_files,
            min_level: self.file_level,
        }
    }
}

impl Config {
    /// Default configuration path.
    #[must_use]
    pub fn default_path() -> PathBuf {
        PathsConfig::default().config_file
    }

    /// Load config from default or explicit path, then apply env overrides.
    ///
    /// Missing config file is not an error when loading from default path; defaults are used.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path_buf = path.map_or_else(Self::default_path, Path::to_path_buf);

        let mut cfg = if path_buf.exists() {
            let raw = fs::read_to_string(&path_buf).map_err(|source| SweepError::Io {
                path: path_buf.clone(),
                source,
            })?;
            Self::from_toml_str(&raw)?
        } else if path.is_some() {
            return Err(SweepError::MissingConfig { path: path_buf });
        } else {
            Self::default()
        };

        cfg.paths.config_file = path_buf;
        cfg.apply_env_overrides_from(env_var)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Parse a TOML document. Unset keys keep their defaults.
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        Ok(toml::from_str(raw)?)
    }

    /// Render the effective configuration as TOML.
    pub fn to_toml_string(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Deterministic hash of the effective config for logging.
    ///
    /// FNV-1a over the canonical JSON, so the value is stable across processes
    /// and toolchain releases.
    pub fn stable_hash(&self) -> Result<String> {
        let canonical = serde_json::to_string(self)?;
        let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
        for byte in canonical.as_bytes() {
            hash ^= u64::from(*byte);
            hash = hash.wrapping_mul(0x0100_0000_01b3);
        }
        Ok(format!("{hash:016x}"))
    }

    fn apply_env_overrides_from<F>(&mut self, mut lookup: F) -> Result<()>
    where
        F: FnMut(&str) -> Option<String>,
    {
        if let Some(raw) = lookup("PYSWEEP_ROOTS") {
            self.sweep.root_paths = env::split_paths(&raw).collect();
        }
        if let Some(raw) = lookup("PYSWEEP_LOG_FILE") {
            self.logging.file = PathBuf::from(raw);
        }
        if let Some(raw) = lookup("PYSWEEP_LOG_ENABLED") {
            self.logging.file_enabled = parse_env_bool("PYSWEEP_LOG_ENABLED", &raw)?;
        }
        if let Some(raw) = lookup("PYSWEEP_LOG_FORMAT") {
            self.logging.format = raw.parse().map_err(|details: String| SweepError::ConfigParse {
                context: "env",
                details: format!("PYSWEEP_LOG_FORMAT={raw:?}: {details}"),
            })?;
        }
        if let Some(raw) = lookup("PYSWEEP_CONSOLE_LOG") {
            self.logging.console = parse_env_bool("PYSWEEP_CONSOLE_LOG", &raw)?;
        }
        if let Some(raw) = lookup("PYSWEEP_LOG_MAX_SIZE_BYTES") {
            self.logging.max_size_bytes = parse_env_u64("PYSWEEP_LOG_MAX_SIZE_BYTES", &raw)?;
        }
        if let Some(raw) = lookup("PYSWEEP_LOG_MAX_ROTATED_FILES") {
            let value = parse_env_u64("PYSWEEP_LOG_MAX_ROTATED_FILES", &raw)?;
            self.logging.max_rotated_files =
                u32::try_from(value).map_err(|error| SweepError::ConfigParse {
                    context: "env",
                    details: format!("PYSWEEP_LOG_MAX_ROTATED_FILES={raw:?}: {error}"),
                })?;
        }
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if self.sweep.root_paths.is_empty() {
            return Err(SweepError::InvalidConfig {
                details: "sweep.root_paths must name at least one root".to_string(),
            });
        }
        if self
            .sweep
            .root_paths
            .iter()
            .any(|p| p.as_os_str().is_empty())
        {
            return Err(SweepError::InvalidConfig {
                details: "sweep.root_paths must not contain empty paths".to_string(),
            });
        }
        if self.logging.file_enabled && self.logging.file.as_os_str().is_empty() {
            return Err(SweepError::InvalidConfig {
                details: "logging.file must be set when logging.file_enabled is true".to_string(),
            });
        }
        if self.logging.max_size_bytes < 1024 {
            return Err(SweepError::InvalidConfig {
                details: format!(
                    "logging.max_size_bytes must be at least 1024, got {}",
                    self.logging.max_size_bytes
                ),
            });
        }
        if self.logging.max_rotated_files > 100 {
            return Err(SweepError::InvalidConfig {
                details: format!(
                    "logging.max_rotated_files must be at most 100, got {}",
                    self.logging.max_rotated_files
                ),
            });
        }
        Ok(())
    }
}

fn env_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|raw| !raw.trim().is_empty())
}

fn parse_env_u64(name: &str, raw: &str) -> Result<u64> {
    raw.trim()
        .parse::<u64>()
        .map_err(|error| SweepError::ConfigParse {
            context: "env",
            details: format!("{name}={raw:?}: {error}"),
        })
}

fn parse_env_bool(name: &str, raw: &str) -> Result<bool> {
    raw.trim()
        .parse::<bool>()
        .map_err(|error| SweepError::ConfigParse {
            context: "env",
            details: format!("{name}={raw:?}: {error}"),
        })
}
