//! Error taxonomy shared by every crate in the workspace.
//!
//! Process-level failures (`ToolError`) stay local to the tool runner and are
//! delivered through its exception callback. Operation-level failures
//! (`OperationError`) travel inside results and are inspected by listeners.
//! Only authorization failures trigger automatic recovery.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Which standard stream of a child process a line or failure belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StreamKind {
    /// Standard output.
    Stdout,
    /// Standard error.
    Stderr,
}

impl StreamKind {
    /// Stable lowercase name, used as a tracing field value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Stdout => "stdout",
            Self::Stderr => "stderr",
        }
    }
}

impl fmt::Display for StreamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failures raised while launching or supervising the command-line tool.
///
/// A non-zero exit code is *not* a `ToolError`; it is surfaced as data.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ToolError {
    /// The tool binary could not be located.
    #[error("Command-line tool not found: {hint}")]
    NotFound {
        /// What was searched for.
        hint: String,
    },

    /// Spawning the child process failed; no readers were started.
    #[error("Failed to launch {}: {reason}", tool.display())]
    LaunchFailed {
        /// Tool path that was executed.
        tool: PathBuf,
        /// OS-level reason.
        reason: String,
    },

    /// Reading one of the output streams failed. Sibling readers keep running.
    #[error("Failed to read {stream}: {reason}")]
    StreamIo {
        /// The stream that failed.
        stream: StreamKind,
        /// Underlying I/O error text.
        reason: String,
    },

    /// Waiting for process exit failed.
    #[error("Failed to wait for process exit: {reason}")]
    Wait {
        /// Underlying I/O error text.
        reason: String,
    },

    /// The command did not finish within the configured timeout.
    #[error("Command timed out after {seconds}s")]
    Timeout {
        /// Configured timeout.
        seconds: u64,
    },
}

/// Failures carried inside operation results.
#[derive(Debug, Clone, Error)]
pub enum OperationError {
    /// Expired, missing or invalid credentials (401/403-equivalent).
    #[error("Not authorized: {message}")]
    NotAuthorized {
        /// Server or tool supplied message.
        message: String,
    },

    /// The command-line tool failed.
    #[error(transparent)]
    Tool(#[from] ToolError),

    /// The remote service answered with an error.
    #[error("Remote service error{}: {message}", status.map(|s| format!(" ({s})")).unwrap_or_default())]
    Remote {
        /// HTTP status, if the failure came from an HTTP response.
        status: Option<u16>,
        /// Description of the failure.
        message: String,
    },

    /// Tool or service output could not be interpreted.
    #[error("Failed to parse output: {0}")]
    Parse(String),

    /// `do_work_async` was called on an operation that already ran.
    #[error("Operation has already been started")]
    AlreadyStarted,

    /// Invalid input supplied by the caller.
    #[error("Invalid input: {0}")]
    Invalid(String),

    /// Unexpected internal condition.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl OperationError {
    /// Create an authorization failure.
    pub fn not_authorized(message: impl Into<String>) -> Self {
        Self::NotAuthorized {
            message: message.into(),
        }
    }

    /// Classify an HTTP status code returned by the remote service.
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        if is_auth_status(status) {
            Self::NotAuthorized { message }
        } else {
            Self::Remote {
                status: Some(status),
                message,
            }
        }
    }

    /// Whether this failure indicates expired or invalid credentials.
    ///
    /// This is the only class of error `AuthRetryCoordinator` recovers from.
    #[must_use]
    pub const fn is_authorization_failure(&self) -> bool {
        match self {
            Self::NotAuthorized { .. } => true,
            Self::Remote {
                status: Some(status),
                ..
            } => is_auth_status(*status),
            _ => false,
        }
    }
}

const fn is_auth_status(status: u16) -> bool {
    status == 401 || status == 403
}

/// Result alias for operation-level work.
pub type OperationResult<T> = Result<T, OperationError>;
