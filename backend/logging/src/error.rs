//! Construction errors.
//!
//! Emission never fails from the caller's point of view; everything here is
//! raised while building a [`Logger`](crate::Logger) or loading its config.

use std::path::PathBuf;

use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced while resolving configuration into a sink.
#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to open log output {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid output path: {0}")]
    InvalidOutputPath(String),

    #[error("invalid log level: {0}")]
    InvalidLevel(String),

    #[error("invalid time format {format:?}: {message}")]
    InvalidTimeFormat { format: String, message: String },

    #[error("failed to read config file {}: {source}", .path.display())]
    ConfigFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {}: {source}", .path.display())]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

impl Error {
    /// True when the error came from the filesystem rather than from validation.
    pub fn is_io(&self) -> bool {
        matches!(self, Error::Io { .. } | Error::ConfigFile { .. })
    }
}
