//! Per-workspace `status` requests for the batcher.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tfbridge_core::domain::server_path;
use tfbridge_core::{
    OperationError, SERVER_ROOT, ServerContext, ServerContextStore, Workspace, WorkspaceDelegate,
};
use tracing::debug;

use super::{CommandRunner, LineParser, StatusCommand};

/// Runs one `status` command per workspace and attributes output lines to
/// the requested server paths that they mention.
///
/// Every requested path gets an entry, empty when no line mentions it or
/// anything below it.
pub struct StatusDelegate {
    runner: CommandRunner,
    context: Arc<ServerContextStore>,
}

impl StatusDelegate {
    /// Create a delegate sharing `context` with other operations.
    pub const fn new(runner: CommandRunner, context: Arc<ServerContextStore>) -> Self {
        Self { runner, context }
    }

    fn context_for(&self, workspace: &Workspace) -> ServerContext {
        let mut context = self.context.snapshot();
        if let Some(ref url) = workspace.collection_url {
            context.collection_url.clone_from(url);
        }
        context
    }
}

#[async_trait]
impl WorkspaceDelegate<Vec<String>> for StatusDelegate {
    async fn execute_request(
        &self,
        workspace: &Workspace,
        server_paths: &[String],
    ) -> Result<HashMap<String, Vec<String>>, OperationError> {
        let command = StatusCommand::new(server_paths.iter().cloned())
            .with_workspace(&workspace.name)
            .with_parser(LineParser);
        let context = self.context_for(workspace);
        let lines = self.runner.run(&command, Some(&context)).await?;
        debug!(workspace = %workspace.name, lines = lines.len(), "status finished");
        Ok(attribute_lines(&lines, server_paths))
    }
}

/// Server items mentioned in a line: each `$/` up to a quote, angle bracket
/// or the end of the line.
fn mentioned_items(line: &str) -> Vec<&str> {
    line.match_indices(SERVER_ROOT)
        .map(|(start, _)| {
            let item = &line[start..];
            let end = item.find(['"', '\'', '<', '>']).unwrap_or(item.len());
            item[..end].trim_end()
        })
        .collect()
}

/// Map each server path to the lines mentioning it or an item below it,
/// compared by whole segment.
fn attribute_lines(lines: &[String], server_paths: &[String]) -> HashMap<String, Vec<String>> {
    let items: Vec<Vec<&str>> = lines.iter().map(|l| mentioned_items(l)).collect();
    server_paths
        .iter()
        .map(|path| {
            let matching = lines
                .iter()
                .zip(&items)
                .filter(|(_, items)| items.iter().any(|item| server_path::is_ancestor(path, item)))
                .map(|(line, _)| line.clone())
                .collect();
            (path.clone(), matching)
        })
        .collect()
}
