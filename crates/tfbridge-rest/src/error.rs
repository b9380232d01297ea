//! Internal error types for REST calls.
//!
//! Mapped to [`OperationError`] at the crate boundary so that 401 and 403
//! responses classify as authorization failures.

use thiserror::Error;
use tfbridge_core::OperationError;

/// Result type alias for REST calls.
pub type RestResult<T> = Result<T, RestError>;

/// Errors raised by the REST client.
#[derive(Debug, Error)]
pub enum RestError {
    /// The server answered with a non-success status.
    #[error("Request to {url} failed with status {status}")]
    Status {
        /// HTTP status code
        status: u16,
        /// The URL that was requested
        url: String,
    },

    /// Network or HTTP client error.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The collection URL or request path did not form a valid URL.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// The response body was not the expected JSON.
    #[error("JSON parsing error: {0}")]
    JsonParse(#[from] serde_json::Error),
}

impl From<RestError> for OperationError {
    fn from(error: RestError) -> Self {
        match error {
            RestError::Status { status, ref url } => {
                Self::from_status(status, format!("request to {url} was rejected"))
            }
            RestError::Network(e) => Self::Remote {
                status: e.status().map(|s| s.as_u16()),
                message: e.to_string(),
            },
            RestError::InvalidUrl(e) => Self::Invalid(format!("invalid URL: {e}")),
            RestError::JsonParse(e) => Self::Parse(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_error_message() {
        let error = RestError::Status {
            status: 404,
            url: "https://dev.azure.com/org/_apis/projects".to_string(),
        };
        let msg = error.to_string();
        assert!(msg.contains("404"));
        assert!(msg.contains("dev.azure.com"));
    }

    #[test]
    fn test_auth_statuses_become_authorization_failures() {
        for status in [401, 403] {
            let error: OperationError = RestError::Status {
                status,
                url: "https://x".to_string(),
            }
            .into();
            assert!(error.is_authorization_failure(), "status {status}");
        }

        let error: OperationError = RestError::Status {
            status: 500,
            url: "https://x".to_string(),
        }
        .into();
        assert!(!error.is_authorization_failure());
        assert!(error.to_string().contains("500"));
    }

    #[test]
    fn test_parse_and_url_errors_map() {
        let json = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        assert!(matches!(OperationError::from(RestError::from(json)), OperationError::Parse(_)));

        let url = url::Url::parse("not a url").unwrap_err();
        assert!(matches!(OperationError::from(RestError::from(url)), OperationError::Invalid(_)));
    }
}
