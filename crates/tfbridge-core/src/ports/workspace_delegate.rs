//! Per-workspace request delegate port.

use std::collections::HashMap;

use async_trait::async_trait;

use crate::domain::Workspace;
use crate::error::OperationError;

/// Executes one batched request for a workspace.
///
/// Implementations may perform process or network I/O. They should return an
/// entry for every requested server path; missing entries surface as `None`
/// in the batch result.
#[async_trait]
pub trait WorkspaceDelegate<T: Send>: Send + Sync {
    /// Run the request for `server_paths`, all owned by `workspace`.
    ///
    /// Returns a map keyed by server path.
    async fn execute_request(
        &self,
        workspace: &Workspace,
        server_paths: &[String],
    ) -> Result<HashMap<String, T>, OperationError>;
}

/// A delegate with no per-path result.
#[async_trait]
pub trait VoidWorkspaceDelegate: Send + Sync {
    /// Run the request for `server_paths`, all owned by `workspace`.
    async fn execute_request(
        &self,
        workspace: &Workspace,
        server_paths: &[String],
    ) -> Result<(), OperationError>;
}
