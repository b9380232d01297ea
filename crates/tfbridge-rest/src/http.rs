//! HTTP backend abstraction.
//!
//! The client talks to a [`HttpBackend`] so tests can substitute canned
//! responses. The production backend uses reqwest and retries transient
//! failures (5xx and network errors) with exponential backoff.

use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, warn};
use url::Url;

use crate::config::RestClientConfig;
use crate::error::RestResult;

/// Basic-auth credentials attached to a request.
#[derive(Clone, PartialEq, Eq)]
pub struct BasicAuth {
    pub user_name: String,
    pub secret: String,
}

impl std::fmt::Debug for BasicAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BasicAuth")
            .field("user_name", &self.user_name)
            .field("secret", &"********")
            .finish()
    }
}

/// A GET request.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub url: Url,
    pub auth: Option<BasicAuth>,
}

/// A response with its status, authentication challenge and body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    /// `WWW-Authenticate` header, if the server sent one.
    pub challenge: Option<String>,
    pub body: String,
}

impl HttpResponse {
    /// Whether the status is 2xx.
    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }
}

/// Executes HTTP requests.
///
/// Non-success statuses are returned as responses, not errors.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait HttpBackend: Send + Sync {
    /// Send `request` and read the whole body.
    async fn send(&self, request: HttpRequest) -> RestResult<HttpResponse>;
}

/// Production HTTP backend using reqwest with retry logic.
pub struct ReqwestBackend {
    client: reqwest::Client,
    max_retries: u8,
    retry_base_delay: Duration,
}

impl ReqwestBackend {
    /// Create a backend with the given configuration.
    pub fn new(config: &RestClientConfig) -> RestResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.clone())
            .build()?;

        Ok(Self {
            client,
            max_retries: config.max_retries,
            retry_base_delay: config.retry_base_delay,
        })
    }

    fn build_request(&self, request: &HttpRequest) -> reqwest::RequestBuilder {
        let builder = self
            .client
            .get(request.url.as_str())
            .header(reqwest::header::ACCEPT, "application/json");
        match request.auth {
            Some(ref auth) => builder.basic_auth(&auth.user_name, Some(&auth.secret)),
            None => builder,
        }
    }

    async fn read(response: reqwest::Response) -> RestResult<HttpResponse> {
        let status = response.status().as_u16();
        let challenge = response
            .headers()
            .get(reqwest::header::WWW_AUTHENTICATE)
            .and_then(|h| h.to_str().ok())
            .map(str::to_string);
        let body = response.text().await?;
        Ok(HttpResponse {
            status,
            challenge,
            body,
        })
    }
}

#[async_trait]
impl HttpBackend for ReqwestBackend {
    async fn send(&self, request: HttpRequest) -> RestResult<HttpResponse> {
        let mut attempt: u8 = 0;
        loop {
            if attempt > 0 {
                let delay = self.retry_base_delay * 2u32.pow(u32::from(attempt) - 1);
                tokio::time::sleep(delay).await;
            }

            match self.build_request(&request).send().await {
                Ok(response) => {
                    let status = response.status();
                    // 5xx errors are retryable (server-side issues)
                    if status.is_server_error() && attempt < self.max_retries {
                        warn!(url = %request.url, status = status.as_u16(), attempt, "Retrying after server error");
                        attempt += 1;
                        continue;
                    }
                    debug!(url = %request.url, status = status.as_u16(), "HTTP response");
                    return Self::read(response).await;
                }
                Err(e) if attempt < self.max_retries => {
                    warn!(url = %request.url, error = %e, attempt, "Retrying after network error");
                    attempt += 1;
                }
                Err(e) => return Err(e.into()),
            }
        }
    }
}
