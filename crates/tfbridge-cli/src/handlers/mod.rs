//! Command handlers.
//!
//! Handlers receive the composed [`crate::CliContext`] and print results to
//! stdout. Diagnostics go through `tracing` to stderr.

pub mod paths;
pub mod projects;
pub mod run;
pub mod status;
pub mod translate;

use tfbridge_core::{OperationEvent, OperationResults};
use tokio::sync::mpsc::UnboundedReceiver;

use crate::error::CliError;

/// Drain an operation's events until completion.
///
/// Returns every payload in delivery order, or the first error. A cancelled
/// run yields the payloads delivered before cancellation.
pub async fn collect_payloads<T>(
    mut events: UnboundedReceiver<OperationEvent<T>>,
) -> Result<Vec<T>, CliError> {
    let mut payloads = Vec::new();
    while let Some(event) = events.recv().await {
        match event {
            OperationEvent::Started => {}
            OperationEvent::Results(results) => {
                if let Some(payload) = accept(results)? {
                    payloads.push(payload);
                }
            }
            OperationEvent::Completed => break,
        }
    }
    Ok(payloads)
}

fn accept<T>(results: OperationResults<T>) -> Result<Option<T>, CliError> {
    if let Some(error) = results.error() {
        return Err(error.clone().into());
    }
    Ok(results.into_payload())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tfbridge_core::OperationError;
    use tokio::sync::mpsc;

    #[tokio::test]
    async fn test_collect_payloads_until_completed() {
        let (tx, rx) = mpsc::unbounded_channel();
        tx.send(OperationEvent::Started).unwrap();
        tx.send(OperationEvent::Results(OperationResults::ok(1))).unwrap();
        tx.send(OperationEvent::Results(OperationResults::ok(2))).unwrap();
        tx.send(OperationEvent::Completed).unwrap();
        tx.send(OperationEvent::Results(OperationResults::ok(3))).unwrap();

        assert_eq!(collect_payloads(rx).await.unwrap(), vec![1, 2]);
    }

    #[tokio::test]
    async fn test_collect_payloads_surfaces_error() {
        let (tx, rx) = mpsc::unbounded_channel::<OperationEvent<u32>>();
        tx.send(OperationEvent::Results(OperationResults::failed(
            OperationError::from_status(403, "denied"),
        )))
        .unwrap();
        tx.send(OperationEvent::Completed).unwrap();

        assert!(matches!(
            collect_payloads(rx).await,
            Err(CliError::Unauthorized(_))
        ));
    }
}
