//! CLI-specific error types and exit codes.

use tfbridge_core::{OperationError, PathError, SettingsError, ToolError};
use thiserror::Error;

/// CLI-specific error type.
#[derive(Debug, Error)]
pub enum CliError {
    /// Invalid command-line input.
    #[error("Invalid arguments: {0}")]
    Arguments(String),

    /// Settings or data files could not be read or written.
    #[error("IO error: {0}")]
    Io(String),

    /// Invalid configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The command-line tool could not be found or run.
    #[error("Tool error: {0}")]
    Tool(String),

    /// Credentials were rejected and could not be refreshed.
    #[error("Not authorized: {0}")]
    Unauthorized(String),

    /// An operation failed.
    #[error("{0}")]
    Operation(String),
}

impl CliError {
    /// Map error to an exit code.
    ///
    /// Exit codes follow sysexits.h where a category fits.
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::Operation(_) => 1,
            Self::Arguments(_) => 2,     // EX_USAGE
            Self::Tool(_) => 69,         // EX_UNAVAILABLE
            Self::Io(_) => 74,           // EX_IOERR
            Self::Unauthorized(_) => 77, // EX_NOPERM
            Self::Config(_) => 78,       // EX_CONFIG
        }
    }
}

impl From<OperationError> for CliError {
    fn from(err: OperationError) -> Self {
        if err.is_authorization_failure() {
            return Self::Unauthorized(err.to_string());
        }
        match err {
            OperationError::Tool(tool) => tool.into(),
            OperationError::Invalid(msg) => Self::Arguments(msg),
            other => Self::Operation(other.to_string()),
        }
    }
}

impl From<ToolError> for CliError {
    fn from(err: ToolError) -> Self {
        Self::Tool(err.to_string())
    }
}

impl From<PathError> for CliError {
    fn from(err: PathError) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<SettingsError> for CliError {
    fn from(err: SettingsError) -> Self {
        Self::Config(err.to_string())
    }
}
