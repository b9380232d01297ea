//! Server connection context and credentials.

use std::fmt;
use std::sync::{PoisonError, RwLock};

use serde::{Deserialize, Serialize};

/// Kind of server the context points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServerKind {
    /// Hosted service (personal access tokens, preemptive basic auth).
    #[default]
    Hosted,
    /// On-premises server.
    OnPremises,
}

/// Credentials for a server.
///
/// `Debug` never prints the secret.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthenticationInfo {
    /// User name (for tokens, any non-empty value is accepted by the server).
    pub user_name: String,
    /// Password or personal access token.
    pub secret: String,
    /// Server URI these credentials were issued for.
    pub server_uri: String,
}

impl AuthenticationInfo {
    /// Create credentials.
    pub fn new(
        user_name: impl Into<String>,
        secret: impl Into<String>,
        server_uri: impl Into<String>,
    ) -> Self {
        Self {
            user_name: user_name.into(),
            secret: secret.into(),
            server_uri: server_uri.into(),
        }
    }
}

impl fmt::Debug for AuthenticationInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthenticationInfo")
            .field("user_name", &self.user_name)
            .field("secret", &"********")
            .field("server_uri", &self.server_uri)
            .finish()
    }
}

/// Everything needed to talk to one collection on a server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerContext {
    /// Collection URL, e.g. `https://dev.azure.com/org` or
    /// `http://server:8080/tfs/defaultcollection`.
    pub collection_url: String,
    /// Server kind.
    #[serde(default)]
    pub kind: ServerKind,
    /// Credentials, if known.
    #[serde(default)]
    pub authentication: Option<AuthenticationInfo>,
}

impl ServerContext {
    /// Create a context without credentials.
    pub fn new(collection_url: impl Into<String>) -> Self {
        Self {
            collection_url: collection_url.into(),
            kind: ServerKind::default(),
            authentication: None,
        }
    }

    /// Set the server kind.
    #[must_use]
    pub const fn with_kind(mut self, kind: ServerKind) -> Self {
        self.kind = kind;
        self
    }

    /// Attach credentials.
    #[must_use]
    pub fn with_authentication(mut self, auth: AuthenticationInfo) -> Self {
        self.authentication = Some(auth);
        self
    }
}

/// Shared, updatable server context.
///
/// Operations snapshot the context at the start of each attempt, so a
/// credential refresh between attempts is picked up by the retry.
#[derive(Debug)]
pub struct ServerContextStore {
    inner: RwLock<ServerContext>,
}

impl ServerContextStore {
    /// Wrap an initial context.
    pub const fn new(context: ServerContext) -> Self {
        Self {
            inner: RwLock::new(context),
        }
    }

    /// Copy of the current context.
    pub fn snapshot(&self) -> ServerContext {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Replace the stored credentials.
    pub fn set_authentication(&self, auth: AuthenticationInfo) {
        self.inner
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .authentication = Some(auth);
    }
}
