//! Port definitions (trait abstractions) for external collaborators.
//!
//! Ports define the interfaces the core expects from infrastructure: who owns
//! a local path, how a batched per-workspace request is executed and how
//! credentials are refreshed. They contain no process or HTTP details.

pub mod credentials;
pub mod workspace_delegate;
pub mod workspace_registry;

pub use credentials::{CredentialRefresher, NoopRefresher, RefreshOutcome};
pub use workspace_delegate::{VoidWorkspaceDelegate, WorkspaceDelegate};
pub use workspace_registry::{WorkspaceRegistry, Workstation};

#[cfg(test)]
pub use credentials::MockCredentialRefresher;
#[cfg(test)]
pub use workspace_registry::MockWorkspaceRegistry;
