//! Path-related error types.

use std::path::PathBuf;
use thiserror::Error;

/// Errors from path resolution and config file access.
#[derive(Debug, Error)]
pub enum PathError {
    /// Could not determine the system data directory.
    #[error("Cannot determine system data directory")]
    NoDataDir,

    /// Failed to create a directory.
    #[error("Failed to create directory {path}: {reason}")]
    CreateFailed { path: PathBuf, reason: String },

    /// Failed to read or write a config file.
    #[error("Failed to access {path}: {reason}")]
    Io { path: PathBuf, reason: String },

    /// A config file exists but is not valid JSON for its type.
    #[error("Malformed {path}: {reason}")]
    Malformed { path: PathBuf, reason: String },
}
