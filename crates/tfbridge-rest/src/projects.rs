//! Team project lookup.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tfbridge_core::{
    EmptyInputs, OperationError, OperationWork, ResultSink, ServerContext, ServerContextStore,
};
use tracing::debug;

use crate::client::RestClient;
use crate::error::RestResult;

const PROJECTS_PATH: &str = "_apis/projects";

/// A team project in a collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamProject {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
}

/// Wire envelope of list responses.
#[derive(Debug, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
struct ListResponse<T> {
    #[serde(default)]
    value: Vec<T>,
}

impl RestClient {
    /// List the team projects of the context's collection.
    pub async fn projects(&self, context: &ServerContext) -> RestResult<Vec<TeamProject>> {
        let list: ListResponse<TeamProject> = self.get_json(context, PROJECTS_PATH, &[]).await?;
        Ok(list.value)
    }
}

/// Parameterless operation listing the team projects of a collection.
///
/// Reads the server context on every execution.
pub struct ProjectLookupOperation {
    client: RestClient,
    context: Arc<ServerContextStore>,
}

impl ProjectLookupOperation {
    pub const fn new(client: RestClient, context: Arc<ServerContextStore>) -> Self {
        Self { client, context }
    }
}

#[async_trait]
impl OperationWork for ProjectLookupOperation {
    type Inputs = EmptyInputs;
    type Output = Vec<TeamProject>;

    fn name(&self) -> &'static str {
        "project-lookup"
    }

    async fn execute(
        &self,
        _inputs: EmptyInputs,
        sink: &ResultSink<Vec<TeamProject>>,
    ) -> Result<(), OperationError> {
        let context = self.context.snapshot();
        let projects = self.client.projects(&context).await?;
        debug!(collection = %context.collection_url, count = projects.len(), "Listed team projects");
        sink.publish(projects);
        Ok(())
    }
}
