//! Workspace-aware request batching.
//!
//! Groups arbitrary local paths by the workspace that owns them, translates
//! each group to server paths and calls the delegate exactly once per
//! workspace. Results are re-keyed by the original local path.
//!
//! Every input path ends up in exactly one of `results` or
//! `workspace_not_found`:
//!
//! - paths no workspace owns go to `workspace_not_found` and are never sent
//!   to a delegate;
//! - paths owned by a workspace but cloaked (or otherwise untranslatable)
//!   appear in `results` as `None` and are not sent to the delegate;
//! - paths the delegate returned no entry for appear in `results` as `None`.
//!
//! Duplicate input paths collapse onto their first occurrence.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use futures_util::future::try_join_all;
use indexmap::IndexMap;
use tracing::{debug, warn};

use crate::domain::Workspace;
use crate::error::OperationError;
use crate::ports::{VoidWorkspaceDelegate, WorkspaceDelegate, WorkspaceRegistry};
use crate::translate::{Translation, local_to_server};

/// Outcome of a batched request.
#[derive(Debug)]
pub struct BatchResult<T> {
    /// Per local path result. `None` when the path was cloaked or the
    /// delegate returned nothing for it.
    pub results: HashMap<PathBuf, Option<T>>,
    /// Local paths owned by no known workspace, in input order.
    pub workspace_not_found: Vec<PathBuf>,
}

impl<T> Default for BatchResult<T> {
    fn default() -> Self {
        Self {
            results: HashMap::new(),
            workspace_not_found: Vec::new(),
        }
    }
}

/// Workspaces are told apart by name and collection: the same name can
/// exist on different servers.
type WorkspaceKey = (String, Option<String>);

/// Paths owned by one workspace, in input order.
struct WorkspaceGroup {
    workspace: Arc<Workspace>,
    local_paths: Vec<PathBuf>,
}

/// Translated request for one workspace.
struct PreparedRequest {
    workspace: Arc<Workspace>,
    /// (local, server) pairs sent to the delegate.
    requested: Vec<(PathBuf, String)>,
}

/// Run `delegate` once per workspace touched by `local_paths`.
pub async fn process_by_workspaces<T, D, P>(
    registry: &dyn WorkspaceRegistry,
    local_paths: &[P],
    delegate: &D,
) -> Result<BatchResult<T>, OperationError>
where
    T: Send,
    D: WorkspaceDelegate<T> + ?Sized,
    P: AsRef<Path>,
{
    let mut batch = BatchResult::default();
    let groups = group_by_workspace(registry, local_paths, &mut batch.workspace_not_found);

    let mut prepared = Vec::with_capacity(groups.len());
    for group in groups.into_values() {
        let mut requested = Vec::with_capacity(group.local_paths.len());
        for local in group.local_paths {
            match local_to_server(&local, &group.workspace.mappings) {
                Translation::Mapped(server) => requested.push((local, server)),
                Translation::Cloaked => {
                    debug!(path = %local.display(), workspace = %group.workspace.name, "Skipping cloaked path");
                    batch.results.insert(local, None);
                }
                Translation::Unmapped => {
                    debug!(path = %local.display(), workspace = %group.workspace.name, "No server path for local path");
                    batch.results.insert(local, None);
                }
            }
        }
        if !requested.is_empty() {
            prepared.push(PreparedRequest {
                workspace: group.workspace,
                requested,
            });
        }
    }

    debug!(
        workspaces = prepared.len(),
        not_found = batch.workspace_not_found.len(),
        "Dispatching batched workspace requests"
    );

    // One call per workspace; distinct workspaces may run concurrently.
    let responses = try_join_all(prepared.iter().map(|request| async move {
        let server_paths: Vec<String> = request.requested.iter().map(|(_, s)| s.clone()).collect();
        delegate
            .execute_request(&request.workspace, &server_paths)
            .await
    }))
    .await?;

    for (request, mut by_server) in prepared.into_iter().zip(responses) {
        for (local, server) in request.requested {
            let value = by_server.remove(&server);
            if value.is_none() {
                warn!(
                    server_path = %server,
                    workspace = %request.workspace.name,
                    "Delegate returned no result for requested server path"
                );
            }
            batch.results.insert(local, value);
        }
    }

    Ok(batch)
}

/// Run `delegate` once per workspace and return only the paths no workspace owns.
pub async fn process_by_workspaces_void<P: AsRef<Path>>(
    registry: &dyn WorkspaceRegistry,
    local_paths: &[P],
    delegate: &dyn VoidWorkspaceDelegate,
) -> Result<Vec<PathBuf>, OperationError> {
    let adapter = VoidAdapter(delegate);
    let batch = process_by_workspaces(registry, local_paths, &adapter).await?;
    Ok(batch.workspace_not_found)
}

fn group_by_workspace<P: AsRef<Path>>(
    registry: &dyn WorkspaceRegistry,
    local_paths: &[P],
    not_found: &mut Vec<PathBuf>,
) -> IndexMap<WorkspaceKey, WorkspaceGroup> {
    let mut seen = HashSet::with_capacity(local_paths.len());
    let mut groups: IndexMap<WorkspaceKey, WorkspaceGroup> = IndexMap::new();

    for path in local_paths {
        let path = path.as_ref().to_path_buf();
        if !seen.insert(path.clone()) {
            continue;
        }
        match registry.find_workspace(&path) {
            Some(workspace) => groups
                .entry((workspace.name.clone(), workspace.collection_url.clone()))
                .or_insert_with(|| WorkspaceGroup {
                    workspace,
                    local_paths: Vec::new(),
                })
                .local_paths
                .push(path),
            None => not_found.push(path),
        }
    }

    groups
}

struct VoidAdapter<'a>(&'a dyn VoidWorkspaceDelegate);

#[async_trait]
impl WorkspaceDelegate<()> for VoidAdapter<'_> {
    async fn execute_request(
        &self,
        workspace: &Workspace,
        server_paths: &[String],
    ) -> Result<HashMap<String, ()>, OperationError> {
        self.0.execute_request(workspace, server_paths).await?;
        Ok(server_paths.iter().map(|s| (s.clone(), ())).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Mapping;
    use crate::ports::{MockWorkspaceRegistry, Workstation};
    use std::sync::Mutex;

    /// Records every call and echoes server paths back as results.
    #[derive(Default)]
    struct RecordingDelegate {
        calls: Mutex<Vec<(String, Vec<String>)>>,
        omit: Option<String>,
    }

    #[async_trait]
    impl WorkspaceDelegate<String> for RecordingDelegate {
        async fn execute_request(
            &self,
            workspace: &Workspace,
            server_paths: &[String],
        ) -> Result<HashMap<String, String>, OperationError> {
            self.calls
                .lock()
                .unwrap()
                .push((workspace.name.clone(), server_paths.to_vec()));
            Ok(server_paths
                .iter()
                .filter(|s| self.omit.as_deref() != Some(s.as_str()))
                .map(|s| (s.clone(), format!("status:{s}")))
                .collect())
        }
    }

    fn workstation() -> Workstation {
        Workstation::new([
            Workspace::new("A").with_mapping(Mapping::new("$/a", "/a")),
            Workspace::new("B")
                .with_mapping(Mapping::new("$/b", "/b"))
                .with_mapping(Mapping::cloaked("$/b/hidden", "/b/hidden")),
        ])
    }

    fn paths(items: &[&str]) -> Vec<PathBuf> {
        items.iter().map(PathBuf::from).collect()
    }

    #[tokio::test]
    async fn test_one_call_per_workspace() {
        let registry = workstation();
        let delegate = RecordingDelegate::default();
        let input = paths(&["/a/1", "/a/2", "/b/1"]);

        let batch = process_by_workspaces(&registry, &input, &delegate).await.unwrap();

        let calls = delegate.calls.lock().unwrap();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0], ("A".to_string(), vec!["$/a/1".to_string(), "$/a/2".to_string()]));
        assert_eq!(calls[1], ("B".to_string(), vec!["$/b/1".to_string()]));

        assert_eq!(batch.results.len(), 3);
        assert_eq!(
            batch.results[Path::new("/a/2")].as_deref(),
            Some("status:$/a/2")
        );
        assert!(batch.workspace_not_found.is_empty());
    }

    #[tokio::test]
    async fn test_unowned_paths_are_reported_not_dispatched() {
        let registry = workstation();
        let delegate = RecordingDelegate::default();
        let input = paths(&["/a/1", "/nowhere/x", "/b/2", "/tmp/y"]);

        let batch = process_by_workspaces(&registry, &input, &delegate).await.unwrap();

        assert_eq!(batch.workspace_not_found, paths(&["/nowhere/x", "/tmp/y"]));
        for missing in &batch.workspace_not_found {
            assert!(!batch.results.contains_key(missing));
        }
        let total = batch.results.len() + batch.workspace_not_found.len();
        assert_eq!(total, input.len());

        let calls = delegate.calls.lock().unwrap();
        assert!(calls.iter().all(|(_, servers)| servers.iter().all(|s| !s.contains("nowhere"))));
    }

    #[tokio::test]
    async fn test_cloaked_paths_get_none_and_are_not_sent() {
        let registry = workstation();
        let delegate = RecordingDelegate::default();
        let input = paths(&["/b/hidden/secret.txt"]);

        let batch = process_by_workspaces(&registry, &input, &delegate).await.unwrap();

        assert!(delegate.calls.lock().unwrap().is_empty());
        assert_eq!(batch.results.len(), 1);
        assert!(batch.results[Path::new("/b/hidden/secret.txt")].is_none());
    }

    #[tokio::test]
    async fn test_missing_delegate_entry_becomes_none() {
        let registry = workstation();
        let delegate = RecordingDelegate {
            omit: Some("$/a/2".to_string()),
            ..Default::default()
        };
        let input = paths(&["/a/1", "/a/2"]);

        let batch = process_by_workspaces(&registry, &input, &delegate).await.unwrap();

        assert_eq!(batch.results.len(), 2);
        assert!(batch.results[Path::new("/a/2")].is_none());
        assert!(batch.results[Path::new("/a/1")].is_some());
    }

    #[tokio::test]
    async fn test_duplicates_collapse() {
        let registry = workstation();
        let delegate = RecordingDelegate::default();
        let input = paths(&["/a/1", "/a/1", "/zzz", "/zzz"]);

        let batch = process_by_workspaces(&registry, &input, &delegate).await.unwrap();

        assert_eq!(delegate.calls.lock().unwrap()[0].1.len(), 1);
        assert_eq!(batch.results.len(), 1);
        assert_eq!(batch.workspace_not_found, paths(&["/zzz"]));
    }

    #[tokio::test]
    async fn test_delegate_error_propagates() {
        struct Failing;

        #[async_trait]
        impl WorkspaceDelegate<()> for Failing {
            async fn execute_request(
                &self,
                _workspace: &Workspace,
                _server_paths: &[String],
            ) -> Result<HashMap<String, ()>, OperationError> {
                Err(OperationError::not_authorized("token expired"))
            }
        }

        let registry = workstation();
        let err = process_by_workspaces(&registry, &paths(&["/a/1"]), &Failing)
            .await
            .unwrap_err();
        assert!(err.is_authorization_failure());
    }

    #[tokio::test]
    async fn test_void_variant_returns_not_found() {
        struct Counting(Mutex<usize>);

        #[async_trait]
        impl VoidWorkspaceDelegate for Counting {
            async fn execute_request(
                &self,
                _workspace: &Workspace,
                _server_paths: &[String],
            ) -> Result<(), OperationError> {
                *self.0.lock().unwrap() += 1;
                Ok(())
            }
        }

        let registry = workstation();
        let delegate = Counting(Mutex::new(0));
        let not_found =
            process_by_workspaces_void(&registry, &paths(&["/a/1", "/b/1", "/c/1"]), &delegate)
                .await
                .unwrap();

        assert_eq!(not_found, paths(&["/c/1"]));
        assert_eq!(*delegate.0.lock().unwrap(), 2);
    }

    #[tokio::test]
    async fn test_same_name_on_different_collections_is_not_merged() {
        let mut registry = MockWorkspaceRegistry::new();
        registry.expect_find_workspace().returning(|path| {
            let url = if path.starts_with("/one") { "https://one/tfs" } else { "https://two/tfs" };
            let local = if path.starts_with("/one") { "/one" } else { "/two" };
            Some(Arc::new(
                Workspace::new("dev")
                    .with_collection_url(url)
                    .with_mapping(Mapping::new("$/p", local)),
            ))
        });

        struct ByCollection(Mutex<Vec<Option<String>>>);

        #[async_trait]
        impl WorkspaceDelegate<()> for ByCollection {
            async fn execute_request(
                &self,
                workspace: &Workspace,
                server_paths: &[String],
            ) -> Result<HashMap<String, ()>, OperationError> {
                self.0.lock().unwrap().push(workspace.collection_url.clone());
                Ok(server_paths.iter().map(|s| (s.clone(), ())).collect())
            }
        }

        let delegate = ByCollection(Mutex::new(Vec::new()));
        let batch = process_by_workspaces(&registry, &paths(&["/one/a", "/two/b", "/one/c"]), &delegate)
            .await
            .unwrap();

        assert_eq!(
            *delegate.0.lock().unwrap(),
            vec![Some("https://one/tfs".to_string()), Some("https://two/tfs".to_string())]
        );
        assert_eq!(batch.results.len(), 3);
    }

    #[tokio::test]
    async fn test_with_mocked_registry() {
        let mut registry = MockWorkspaceRegistry::new();
        registry.expect_find_workspace().returning(|path| {
            path.starts_with("/m").then(|| {
                Arc::new(Workspace::new("M").with_mapping(Mapping::new("$/m", "/m")))
            })
        });
        let delegate = RecordingDelegate::default();

        let batch = process_by_workspaces(&registry, &paths(&["/m/x", "/n/y"]), &delegate)
            .await
            .unwrap();

        assert_eq!(batch.results.len(), 1);
        assert_eq!(batch.workspace_not_found, paths(&["/n/y"]));
    }
}
