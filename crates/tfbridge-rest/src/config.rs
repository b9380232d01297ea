//! Public configuration for the REST client.

use std::time::Duration;

use tfbridge_core::DEFAULT_API_VERSION;

/// Configuration for the REST client.
///
/// ```
/// use std::time::Duration;
/// use tfbridge_rest::RestClientConfig;
///
/// let config = RestClientConfig::new()
///     .with_timeout(Duration::from_secs(60))
///     .with_api_version("5.0");
/// ```
#[derive(Debug, Clone)]
pub struct RestClientConfig {
    /// User agent string for HTTP requests
    pub(crate) user_agent: String,
    /// Request timeout
    pub(crate) timeout: Duration,
    /// `api-version` query parameter sent with every request
    pub(crate) api_version: String,
    /// Maximum number of retry attempts for 5xx and network errors
    pub(crate) max_retries: u8,
    /// Base delay for exponential backoff
    pub(crate) retry_base_delay: Duration,
}

impl Default for RestClientConfig {
    fn default() -> Self {
        Self {
            user_agent: concat!("tfbridge/", env!("CARGO_PKG_VERSION")).to_string(),
            timeout: Duration::from_secs(30),
            api_version: DEFAULT_API_VERSION.to_string(),
            max_retries: 2,
            retry_base_delay: Duration::from_millis(500),
        }
    }
}

impl RestClientConfig {
    /// Create a configuration with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the user agent string.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Set the request timeout.
    ///
    /// Defaults to 30 seconds.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the REST API version.
    #[must_use]
    pub fn with_api_version(mut self, version: impl Into<String>) -> Self {
        self.api_version = version.into();
        self
    }

    /// Set the maximum number of retry attempts for transient errors.
    ///
    /// Defaults to 2. Authorization failures are never retried here.
    #[must_use]
    pub const fn with_max_retries(mut self, retries: u8) -> Self {
        self.max_retries = retries;
        self
    }

    /// Set the base delay for exponential backoff retries.
    #[must_use]
    pub const fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_base_delay = delay;
        self
    }

    /// Configured API version.
    pub fn api_version(&self) -> &str {
        &self.api_version
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = RestClientConfig::new();
        assert!(config.user_agent.starts_with("tfbridge/"));
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.api_version(), DEFAULT_API_VERSION);
        assert_eq!(config.max_retries, 2);
    }

    #[test]
    fn test_builder_pattern() {
        let config = RestClientConfig::new()
            .with_user_agent("test-agent")
            .with_timeout(Duration::from_secs(5))
            .with_api_version("5.0")
            .with_max_retries(0)
            .with_retry_delay(Duration::from_millis(1));

        assert_eq!(config.user_agent, "test-agent");
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.api_version(), "5.0");
        assert_eq!(config.max_retries, 0);
        assert_eq!(config.retry_base_delay, Duration::from_millis(1));
    }
}
