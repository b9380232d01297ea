//! Workspace and mapping domain types.

use std::path::{Component, Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::server_path;

/// Resolve `.` and `..` components lexically, without touching the
/// filesystem. `..` never climbs above the root of an absolute path.
#[must_use]
pub fn normalize_local(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.components().next_back() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir | Component::Prefix(_)) => {}
                _ => out.push(".."),
            },
            other => out.push(other),
        }
    }
    out
}

/// A single (server path, local path) pairing within a workspace.
///
/// A cloaked mapping excludes its server sub-tree from translation even when
/// it is nested under an otherwise mapped path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mapping {
    /// Repository path, e.g. `$/Project/src`.
    pub server_path: String,
    /// Local filesystem path the server path is mapped to.
    pub local_path: PathBuf,
    /// Whether this mapping excludes its sub-tree.
    #[serde(default)]
    pub cloaked: bool,
}

impl Mapping {
    /// Create a regular (non-cloaked) mapping.
    pub fn new(server_path: impl AsRef<str>, local_path: impl Into<PathBuf>) -> Self {
        Self {
            server_path: server_path::normalize(server_path.as_ref()),
            local_path: local_path.into(),
            cloaked: false,
        }
    }

    /// Create a cloaked mapping.
    pub fn cloaked(server_path: impl AsRef<str>, local_path: impl Into<PathBuf>) -> Self {
        Self {
            cloaked: true,
            ..Self::new(server_path, local_path)
        }
    }

    /// Whether this mapping's local path is `path` or one of its ancestors.
    ///
    /// Both sides are compared after [`normalize_local`].
    #[must_use]
    pub fn covers_local(&self, path: &Path) -> bool {
        normalize_local(path).starts_with(normalize_local(&self.local_path))
    }

    /// Number of components in the normalized local path.
    pub(crate) fn local_depth(&self) -> usize {
        normalize_local(&self.local_path).components().count()
    }

    /// Whether this mapping's server path is `path` or one of its ancestors.
    #[must_use]
    pub fn covers_server(&self, path: &str) -> bool {
        server_path::is_ancestor(&self.server_path, path)
    }
}

/// A named local-to-repository mapping configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Workspace {
    /// Workspace name, unique per workstation.
    pub name: String,
    /// Owner as reported by the server, if known.
    #[serde(default)]
    pub owner: Option<String>,
    /// Collection URL the workspace belongs to, if known.
    #[serde(default)]
    pub collection_url: Option<String>,
    /// Ordered set of mappings.
    #[serde(default)]
    pub mappings: Vec<Mapping>,
}

impl Workspace {
    /// Create an empty workspace.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            owner: None,
            collection_url: None,
            mappings: Vec::new(),
        }
    }

    /// Add a mapping.
    #[must_use]
    pub fn with_mapping(mut self, mapping: Mapping) -> Self {
        self.mappings.push(mapping);
        self
    }

    /// Set the collection URL.
    #[must_use]
    pub fn with_collection_url(mut self, url: impl Into<String>) -> Self {
        self.collection_url = Some(url.into());
        self
    }

    /// Length (in components) of the longest non-cloaked local mapping covering
    /// `path`, or `None` when this workspace doesn't own it.
    #[must_use]
    pub fn local_match_depth(&self, path: &Path) -> Option<usize> {
        self.mappings
            .iter()
            .filter(|m| !m.cloaked && m.covers_local(path))
            .map(Mapping::local_depth)
            .max()
    }
}
