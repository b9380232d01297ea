//! `projects`: list the collection's team projects.

use std::sync::Arc;

use tfbridge_core::{AuthRetryCoordinator, ChannelListener, EMPTY_INPUTS};
use tfbridge_rest::{ProjectLookupOperation, TeamProject};

use super::collect_payloads;
use crate::bootstrap::CliContext;
use crate::error::CliError;

/// Execute the projects command.
pub async fn execute(ctx: &CliContext) -> Result<(), CliError> {
    ctx.require_collection()?;
    let work = Arc::new(ProjectLookupOperation::new(
        ctx.rest_client()?,
        Arc::clone(&ctx.server),
    ));

    let (listener, events) = ChannelListener::<Vec<TeamProject>>::new();
    let coordinator =
        AuthRetryCoordinator::new(work, Arc::clone(&ctx.refresher), Arc::new(listener));
    coordinator.start(EMPTY_INPUTS)?;

    for project in collect_payloads(events).await?.into_iter().flatten() {
        match project.description.as_deref().filter(|d| !d.is_empty()) {
            Some(description) => println!("{}\t{description}", project.name),
            None => println!("{}", project.name),
        }
    }
    Ok(())
}
