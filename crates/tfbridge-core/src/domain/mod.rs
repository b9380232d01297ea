//! Domain types: workspaces, mappings, server paths and server contexts.

mod context;
pub mod server_path;
mod workspace;

pub use context::{AuthenticationInfo, ServerContext, ServerContextStore, ServerKind};
pub use server_path::{SERVER_ROOT, is_server_item};
pub use workspace::{Mapping, Workspace, normalize_local};
