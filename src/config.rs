//! Load options and log level settings.
//!
//! `LoadOptions` is serde-friendly so callers can embed it in their own
//! configuration files, or keep it in a standalone JSON file.

use std::path::Path;

use serde::{Deserialize, Serialize};

/// Log level setting for the command line front end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Show only errors
    Error,
    /// Show errors and warnings
    Warn,
    /// Show errors, warnings, and info messages
    #[default]
    Info,
    /// Show debug-level logging
    Debug,
    /// Show all log messages including trace
    Trace,
}

impl LogLevel {
    /// Convert to log crate's LevelFilter.
    pub fn to_level_filter(self) -> log::LevelFilter {
        match self {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

/// Errors from reading a configuration file.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Options shared by discovery and stacking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoadOptions {
    /// Decode files on the rayon pool. Output order is the manifest order either way.
    pub parallel: bool,

    /// Size of a dedicated decode pool; `None` uses the global rayon pool
    pub threads: Option<usize>,

    /// Follow symbolic links while walking the directory tree
    pub follow_links: bool,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            parallel: true,
            threads: None,
            follow_links: false,
        }
    }
}

impl LoadOptions {
    /// Options for a single-threaded, strictly sequential load.
    pub fn sequential() -> Self {
        Self {
            parallel: false,
            ..Self::default()
        }
    }

    /// Read options from a JSON file. Missing keys keep their defaults.
    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&contents)?)
    }
}
