//! Local ⇄ server path translation.
//!
//! Both directions pick the mapping with the longest matching ancestor and
//! then apply cloaking:
//!
//! - local → server: only non-cloaked mappings are candidates. The result is
//!   [`Translation::Cloaked`] when a cloaked mapping whose server path is more
//!   specific than the winner's is an ancestor of the candidate server path.
//! - server → local: every mapping is a candidate; if the winner is itself
//!   cloaked the result is [`Translation::Cloaked`].
//!
//! "No mapping" and "cloaked" are distinct outcomes, neither is an error.

use std::path::{Component, Path, PathBuf};

use crate::domain::{Mapping, normalize_local, server_path};

/// Outcome of translating a path through a workspace's mappings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Translation<P> {
    /// The translated path.
    Mapped(P),
    /// The path falls under a cloaked sub-tree.
    Cloaked,
    /// No mapping covers the path.
    Unmapped,
}

impl<P> Translation<P> {
    /// The translated path, if any.
    pub fn into_mapped(self) -> Option<P> {
        match self {
            Self::Mapped(p) => Some(p),
            Self::Cloaked | Self::Unmapped => None,
        }
    }

    /// Whether a cloaked mapping suppressed the translation.
    pub const fn is_cloaked(&self) -> bool {
        matches!(self, Self::Cloaked)
    }
}

/// Translate a local filesystem path into a server path.
///
/// `.` and `..` in `local_path` are resolved lexically first.
pub fn local_to_server(local_path: &Path, mappings: &[Mapping]) -> Translation<String> {
    let local_path = normalize_local(local_path);
    let Some(winner) = mappings
        .iter()
        .filter(|m| !m.cloaked && m.covers_local(&local_path))
        .max_by_key(|m| m.local_depth())
    else {
        return Translation::Unmapped;
    };

    let Ok(rest) = local_path.strip_prefix(normalize_local(&winner.local_path)) else {
        return Translation::Unmapped;
    };
    let rest: Vec<String> = rest
        .components()
        .filter_map(|c| match c {
            Component::Normal(s) => Some(s.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect();
    let candidate = server_path::join(&winner.server_path, rest.iter().map(String::as_str));

    let winner_len = server_path::normalize(&winner.server_path).len();
    let cloaked = mappings.iter().any(|m| {
        m.cloaked
            && server_path::normalize(&m.server_path).len() > winner_len
            && m.covers_server(&candidate)
    });

    if cloaked {
        Translation::Cloaked
    } else {
        Translation::Mapped(candidate)
    }
}

/// Translate a server path into a local filesystem path.
pub fn server_to_local(server: &str, mappings: &[Mapping]) -> Translation<PathBuf> {
    let server = server_path::normalize(server);
    let Some(winner) = mappings
        .iter()
        .filter(|m| m.covers_server(&server))
        .max_by_key(|m| server_path::normalize(&m.server_path).len())
    else {
        return Translation::Unmapped;
    };

    if winner.cloaked {
        return Translation::Cloaked;
    }

    let Some(rest) = server_path::relative_segments(&winner.server_path, &server) else {
        return Translation::Unmapped;
    };
    let mut local = winner.local_path.clone();
    local.extend(rest);
    Translation::Mapped(local)
}
