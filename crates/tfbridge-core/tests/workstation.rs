//! Batching over a persisted set of workspaces.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;
use tfbridge_core::{
    Mapping, OperationError, Translation, Workspace, WorkspaceDelegate, Workstation,
    load_workspaces, process_by_workspaces, save_workspaces, server_to_local,
};

fn workspaces(root: &Path) -> Vec<Workspace> {
    vec![
        Workspace::new("main")
            .with_collection_url("http://server:8080/tfs/defaultcollection")
            .with_mapping(Mapping::new("$/Proj", root.join("proj")))
            .with_mapping(Mapping::cloaked("$/Proj/bin", root.join("proj").join("bin"))),
        Workspace::new("docs").with_mapping(Mapping::new("$/Docs", root.join("docs"))),
    ]
}

/// Echoes each server path back and records the calls it received.
#[derive(Default)]
struct Echo {
    calls: Mutex<Vec<(String, Vec<String>)>>,
}

#[async_trait]
impl WorkspaceDelegate<String> for Echo {
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
            .map(|p| (p.clone(), format!("{}:{p}", workspace.name)))
            .collect())
    }
}

#[tokio::test]
async fn test_batch_over_saved_workspaces() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().join("src");
    let file = dir.path().join("workspaces.json");
    save_workspaces(&file, &workspaces(&root)).unwrap();

    let workstation = Workstation::new(load_workspaces(&file).unwrap());
    let inputs: Vec<PathBuf> = vec![
        root.join("proj").join("a.txt"),
        root.join("docs").join("readme.md"),
        root.join("proj").join("bin").join("out.dll"),
        root.join("proj").join("lib").join("b.rs"),
        dir.path().join("elsewhere").join("c.txt"),
    ];

    let echo = Echo::default();
    let batch = process_by_workspaces(&workstation, &inputs, &echo).await.unwrap();

    let mut calls = echo.calls.into_inner().unwrap();
    calls.sort();
    assert_eq!(
        calls,
        vec![
            ("docs".to_string(), vec!["$/Docs/readme.md".to_string()]),
            (
                "main".to_string(),
                vec!["$/Proj/a.txt".to_string(), "$/Proj/lib/b.rs".to_string()]
            ),
        ]
    );

    assert_eq!(batch.workspace_not_found, vec![inputs[4].clone()]);
    assert_eq!(batch.results.len(), 4);
    assert_eq!(batch.results[&inputs[0]].as_deref(), Some("main:$/Proj/a.txt"));
    assert_eq!(batch.results[&inputs[1]].as_deref(), Some("docs:$/Docs/readme.md"));
    assert_eq!(batch.results[&inputs[2]], None);
}

#[test]
fn test_server_to_local_respects_cloak() {
    let root = PathBuf::from("/work");
    let main = &workspaces(&root)[0];

    assert_eq!(
        server_to_local("$/Proj/src/lib.rs", &main.mappings),
        Translation::Mapped(root.join("proj").join("src").join("lib.rs"))
    );
    assert!(server_to_local("$/Proj/bin/out.dll", &main.mappings).is_cloaked());
    assert_eq!(server_to_local("$/Other", &main.mappings), Translation::Unmapped);
}
