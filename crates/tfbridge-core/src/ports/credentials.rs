//! Credential refresh port.
//!
//! Credential storage and prompting live outside this crate. The retry
//! protocol only needs to ask for fresh credentials and learn whether the
//! user supplied them.

use async_trait::async_trait;

use crate::domain::AuthenticationInfo;
use crate::error::OperationError;

/// Result of asking for fresh credentials.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// New credentials are available and have been stored wherever the
    /// operation reads them from.
    Refreshed(AuthenticationInfo),
    /// The user declined or cancelled the credential prompt.
    Declined,
}

/// Obtains fresh credentials after an authorization failure.
///
/// Implementations may block on user interaction; callers invoke them from a
/// background task.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CredentialRefresher: Send + Sync {
    /// Refresh the credentials that produced `failure`.
    async fn refresh(&self, failure: &OperationError) -> Result<RefreshOutcome, OperationError>;
}

/// A refresher that always declines. Useful for non-interactive contexts.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopRefresher;

#[async_trait]
impl CredentialRefresher for NoopRefresher {
    async fn refresh(&self, _failure: &OperationError) -> Result<RefreshOutcome, OperationError> {
        Ok(RefreshOutcome::Declined)
    }
}
