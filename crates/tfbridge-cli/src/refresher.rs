//! Non-interactive credential refresh from the environment.
//!
//! After an authorization failure the `.env` file in the data directory is
//! re-read, so a token rotated while a command runs is picked up by the
//! retry. The refresh is declined when no different token is available.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use tfbridge_core::{
    AuthenticationInfo, CredentialRefresher, OperationError, RefreshOutcome, ServerContextStore,
};
use tracing::{debug, info};

/// Environment variable holding the token.
pub const TOKEN_ENV: &str = "TFBRIDGE_TOKEN";

/// User name sent with a token when none is configured.
pub const DEFAULT_TOKEN_USER: &str = "token";

/// Refreshes the token from an env file, then the process environment.
pub struct EnvTokenRefresher {
    context: Arc<ServerContextStore>,
    env_file: Option<PathBuf>,
    user_name: String,
}

impl EnvTokenRefresher {
    pub fn new(context: Arc<ServerContextStore>, user_name: impl Into<String>) -> Self {
        Self {
            context,
            env_file: None,
            user_name: user_name.into(),
        }
    }

    /// Read the token from `path` before the process environment.
    #[must_use]
    pub fn with_env_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.env_file = Some(path.into());
        self
    }

    fn token_from_file(&self) -> Option<String> {
        let path = self.env_file.as_ref()?;
        let entries = dotenvy::from_path_iter(path).ok()?;
        entries
            .filter_map(Result::ok)
            .find(|(key, _)| key == TOKEN_ENV)
            .map(|(_, value)| value)
    }

    fn token(&self) -> Option<String> {
        self.token_from_file()
            .or_else(|| std::env::var(TOKEN_ENV).ok())
            .filter(|t| !t.trim().is_empty())
    }
}

#[async_trait]
impl CredentialRefresher for EnvTokenRefresher {
    async fn refresh(&self, failure: &OperationError) -> Result<RefreshOutcome, OperationError> {
        debug!(error = %failure, "Looking for a replacement token");
        let current = self.context.snapshot();
        let Some(token) = self.token() else {
            return Ok(RefreshOutcome::Declined);
        };
        if current
            .authentication
            .as_ref()
            .is_some_and(|auth| auth.secret == token)
        {
            debug!("Token unchanged; declining refresh");
            return Ok(RefreshOutcome::Declined);
        }

        info!("Using refreshed token");
        let auth = AuthenticationInfo::new(&self.user_name, token, &current.collection_url);
        self.context.set_authentication(auth.clone());
        Ok(RefreshOutcome::Refreshed(auth))
    }
}
