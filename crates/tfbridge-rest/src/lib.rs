//! REST client for tfbridge.
//!
//! Requests carry the configured user agent and basic credentials from the
//! [`tfbridge_core::ServerContext`]. 401 and 403 responses map to
//! authorization failures, so operations built on this client recover
//! through [`tfbridge_core::AuthRetryCoordinator`] like tool commands do.
#![deny(unused_crate_dependencies)]

mod client;
mod config;
mod error;
mod http;
mod projects;

pub use client::RestClient;
pub use config::RestClientConfig;
pub use error::{RestError, RestResult};
pub use http::{BasicAuth, HttpBackend, HttpRequest, HttpResponse, ReqwestBackend};
pub use projects::{ProjectLookupOperation, TeamProject};
