//! Workspace registry port.
//!
//! Resolves which workspace owns a local path. The registry is passed
//! explicitly to whatever needs it; there is no process-wide instance.

use std::path::Path;
use std::sync::{Arc, PoisonError, RwLock};

use crate::domain::Workspace;

/// Lookup of the workspace owning a local path.
#[cfg_attr(test, mockall::automock)]
pub trait WorkspaceRegistry: Send + Sync {
    /// The workspace whose mappings own `local_path`, if any.
    fn find_workspace(&self, local_path: &Path) -> Option<Arc<Workspace>>;
}

/// In-memory registry of the workspaces known on this machine.
///
/// A path is owned by the workspace with the most specific non-cloaked local
/// mapping covering it.
#[derive(Debug, Default)]
pub struct Workstation {
    workspaces: RwLock<Vec<Arc<Workspace>>>,
}

impl Workstation {
    /// Create a registry from a set of workspaces.
    pub fn new(workspaces: impl IntoIterator<Item = Workspace>) -> Self {
        Self {
            workspaces: RwLock::new(workspaces.into_iter().map(Arc::new).collect()),
        }
    }

    /// Add a workspace, replacing any existing one with the same name.
    pub fn upsert(&self, workspace: Workspace) {
        let mut guard = self.workspaces.write().unwrap_or_else(PoisonError::into_inner);
        guard.retain(|w| w.name != workspace.name);
        guard.push(Arc::new(workspace));
    }

    /// Remove a workspace by name. Returns true if it existed.
    pub fn remove(&self, name: &str) -> bool {
        let mut guard = self.workspaces.write().unwrap_or_else(PoisonError::into_inner);
        let before = guard.len();
        guard.retain(|w| w.name != name);
        guard.len() != before
    }

    /// Snapshot of all registered workspaces.
    pub fn workspaces(&self) -> Vec<Arc<Workspace>> {
        self.workspaces
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Look up a workspace by name.
    pub fn get(&self, name: &str) -> Option<Arc<Workspace>> {
        self.workspaces
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .find(|w| w.name == name)
            .cloned()
    }
}

impl WorkspaceRegistry for Workstation {
    fn find_workspace(&self, local_path: &Path) -> Option<Arc<Workspace>> {
        self.workspaces
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter_map(|w| w.local_match_depth(local_path).map(|depth| (depth, w)))
            .max_by_key(|(depth, _)| *depth)
            .map(|(_, w)| Arc::clone(w))
    }
}
