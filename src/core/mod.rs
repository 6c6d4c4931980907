//! Core types: errors, configuration, root resolution.

pub mod config;
pub mod errors;
pub mod paths;
