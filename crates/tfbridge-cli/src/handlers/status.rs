//! `status`: pending changes for local paths across workspaces.
//!
//! The paths are batched per owning workspace, each batch runs one `status`
//! invocation, and the whole batch retries once after a token refresh.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use tfbridge_core::{
    AuthRetryCoordinator, ChannelListener, OperationError, OperationWork, ResultSink,
    WorkspaceDelegate, WorkspaceRegistry, process_by_workspaces,
};
use tfbridge_runtime::StatusDelegate;
use tracing::info;

use super::collect_payloads;
use crate::bootstrap::CliContext;
use crate::error::CliError;

/// Status lines per requested path, plus the paths no workspace owns.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusReport {
    /// In input order. `None` for cloaked paths or missing delegate answers.
    pub entries: Vec<(PathBuf, Option<Vec<String>>)>,
    pub workspace_not_found: Vec<PathBuf>,
}

/// Batched status over a workspace registry.
pub struct StatusBatch<D> {
    registry: Arc<dyn WorkspaceRegistry>,
    delegate: D,
}

impl<D> StatusBatch<D> {
    pub fn new(registry: Arc<dyn WorkspaceRegistry>, delegate: D) -> Self {
        Self { registry, delegate }
    }
}

#[async_trait]
impl<D> OperationWork for StatusBatch<D>
where
    D: WorkspaceDelegate<Vec<String>> + 'static,
{
    type Inputs = Vec<PathBuf>;
    type Output = StatusReport;

    fn name(&self) -> &'static str {
        "status"
    }

    async fn execute(
        &self,
        paths: Vec<PathBuf>,
        sink: &ResultSink<StatusReport>,
    ) -> Result<(), OperationError> {
        let mut batch = process_by_workspaces(self.registry.as_ref(), &paths, &self.delegate).await?;

        let mut entries = Vec::with_capacity(batch.results.len());
        for path in paths {
            // Duplicates were collapsed onto their first occurrence
            if let Some(lines) = batch.results.remove(&path) {
                entries.push((path, lines));
            }
        }
        sink.publish(StatusReport {
            entries,
            workspace_not_found: batch.workspace_not_found,
        });
        Ok(())
    }
}

fn print(report: &StatusReport) {
    for (path, lines) in &report.entries {
        match lines {
            Some(lines) if !lines.is_empty() => {
                println!("{}:", path.display());
                for line in lines {
                    println!("  {line}");
                }
            }
            Some(_) => println!("{}: no pending changes", path.display()),
            None => println!("{}: not available (cloaked or unanswered)", path.display()),
        }
    }
    for path in &report.workspace_not_found {
        println!("{}: not in any known workspace", path.display());
    }
}

/// Execute the status command.
pub async fn execute(ctx: &CliContext, paths: Vec<PathBuf>) -> Result<(), CliError> {
    let delegate = StatusDelegate::new(ctx.command_runner()?, Arc::clone(&ctx.server));
    let registry: Arc<dyn WorkspaceRegistry> = ctx.workstation.clone();
    let work = Arc::new(StatusBatch::new(registry, delegate));

    let (listener, events) = ChannelListener::<StatusReport>::new();
    let coordinator =
        AuthRetryCoordinator::new(work, Arc::clone(&ctx.refresher), Arc::new(listener));
    coordinator.start(paths)?;

    let reports = collect_payloads(events).await?;
    info!(attempts = coordinator.attempts(), "Status finished");
    for report in &reports {
        print(report);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tfbridge_core::{Mapping, Operation, OperationEvent, Workspace, Workstation};

    struct Fixed;

    #[async_trait]
    impl WorkspaceDelegate<Vec<String>> for Fixed {
        async fn execute_request(
            &self,
            workspace: &Workspace,
            server_paths: &[String],
        ) -> Result<HashMap<String, Vec<String>>, OperationError> {
            Ok(server_paths
                .iter()
                .map(|p| (p.clone(), vec![format!("{} edit {p}", workspace.name)]))
                .collect())
        }
    }

    #[tokio::test]
    async fn test_status_batch_keeps_input_order() {
        let registry: Arc<dyn WorkspaceRegistry> = Arc::new(Workstation::new([Workspace::new("ws")
            .with_mapping(Mapping::new("$/P", "/src"))
            .with_mapping(Mapping::cloaked("$/P/obj", "/src/obj"))]));
        let op = Operation::new(StatusBatch::new(registry, Fixed));
        let (_id, mut rx) = op.subscribe();

        let inputs = vec![
            PathBuf::from("/src/b.rs"),
            PathBuf::from("/src/obj/x.o"),
            PathBuf::from("/tmp/y"),
            PathBuf::from("/src/a.rs"),
            PathBuf::from("/src/b.rs"),
        ];
        op.do_work_async(inputs).unwrap().await.unwrap();

        let mut report = None;
        while let Ok(event) = rx.try_recv() {
            if let OperationEvent::Results(r) = event {
                report = r.into_payload();
            }
        }
        let report = report.unwrap();
        assert_eq!(
            report.entries,
            vec![
                (PathBuf::from("/src/b.rs"), Some(vec!["ws edit $/P/b.rs".to_string()])),
                (PathBuf::from("/src/obj/x.o"), None),
                (PathBuf::from("/src/a.rs"), Some(vec!["ws edit $/P/a.rs".to_string()])),
            ]
        );
        assert_eq!(report.workspace_not_found, vec![PathBuf::from("/tmp/y")]);
    }
}
