//! Authenticated JSON client for a collection's REST API.
//!
//! Hosted servers get credentials preemptively. On-premises servers are
//! first asked anonymously; credentials are only sent after the server
//! answers 401 with a `Basic` challenge.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use tfbridge_core::{ServerContext, ServerKind};
use tracing::debug;
use url::Url;

use crate::config::RestClientConfig;
use crate::error::{RestError, RestResult};
use crate::http::{BasicAuth, HttpBackend, HttpRequest, HttpResponse, ReqwestBackend};

const UNAUTHORIZED: u16 = 401;

/// REST client bound to a backend and a configuration.
#[derive(Clone)]
pub struct RestClient {
    backend: Arc<dyn HttpBackend>,
    config: RestClientConfig,
}

impl RestClient {
    /// Create a client using reqwest.
    pub fn new(config: RestClientConfig) -> RestResult<Self> {
        let backend = ReqwestBackend::new(&config)?;
        Ok(Self::with_backend(Arc::new(backend), config))
    }

    /// Create a client over an explicit backend.
    pub fn with_backend(backend: Arc<dyn HttpBackend>, config: RestClientConfig) -> Self {
        Self { backend, config }
    }

    /// Build `<collection>/<path>?api-version=<v>&<query>`.
    pub fn endpoint(
        &self,
        context: &ServerContext,
        path: &str,
        query: &[(&str, &str)],
    ) -> RestResult<Url> {
        let base = context.collection_url.trim().trim_end_matches('/');
        let mut url = Url::parse(&format!("{base}/{}", path.trim_start_matches('/')))?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("api-version", &self.config.api_version);
            for (key, value) in query {
                pairs.append_pair(key, value);
            }
        }
        Ok(url)
    }

    /// GET `path` under the context's collection and deserialize the body.
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        context: &ServerContext,
        path: &str,
        query: &[(&str, &str)],
    ) -> RestResult<T> {
        let url = self.endpoint(context, path, query)?;
        let response = self.send_authenticated(context, url.clone()).await?;
        if !response.is_success() {
            return Err(RestError::Status {
                status: response.status,
                url: url.to_string(),
            });
        }
        Ok(serde_json::from_str(&response.body)?)
    }

    async fn send_authenticated(&self, context: &ServerContext, url: Url) -> RestResult<HttpResponse> {
        let auth = context.authentication.as_ref().map(|a| BasicAuth {
            user_name: a.user_name.clone(),
            secret: a.secret.clone(),
        });

        let preemptive = context.kind == ServerKind::Hosted;
        let first = HttpRequest {
            url: url.clone(),
            auth: if preemptive { auth.clone() } else { None },
        };
        let response = self.backend.send(first).await?;

        if preemptive || response.status != UNAUTHORIZED || !offers_basic(&response) {
            return Ok(response);
        }
        let Some(auth) = auth else {
            return Ok(response);
        };
        debug!(url = %url, "Answering basic authentication challenge");
        self.backend
            .send(HttpRequest {
                url,
                auth: Some(auth),
            })
            .await
    }
}

fn offers_basic(response: &HttpResponse) -> bool {
    response
        .challenge
        .as_deref()
        .is_some_and(|c| c.to_ascii_lowercase().contains("basic"))
}
