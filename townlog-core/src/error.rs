//! Error types for townlog-core

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for the townlog-core library
#[derive(Error, Debug)]
pub enum Error {
    /// IO error (directory/file creation, append, read)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON encoding or decoding error for a single record
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Caller is not operating inside a recognized town
    #[error("not in a town workspace: {0}")]
    WorkspaceNotFound(String),

    /// Unparseable relative time window (e.g. `--since 1x`)
    #[error("invalid duration {input:?}: {reason}")]
    InvalidDuration { input: String, reason: String },

    /// The followed log file went away
    #[error("log file is no longer available: {}", .0.display())]
    LogUnavailable(PathBuf),
}

/// Result type alias for townlog-core
pub type Result<T> = std::result::Result<T, Error>;
