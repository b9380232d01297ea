//! Tool commands as operations.

use std::sync::Arc;

use async_trait::async_trait;
use tfbridge_core::{
    EmptyInputs, OperationError, OperationWork, ResultSink, ServerContextStore,
};
use tracing::debug;

use super::{CommandRunner, ToolCommand};

/// Runs one [`ToolCommand`] per execution and publishes its parsed output.
///
/// The server context is read at the start of every execution, so a retry
/// after a credential refresh runs with the new credentials.
pub struct CommandOperation<C> {
    runner: CommandRunner,
    context: Option<Arc<ServerContextStore>>,
    command: C,
}

impl<C: ToolCommand> CommandOperation<C> {
    /// Run `command` with `runner` and no server context.
    pub const fn new(runner: CommandRunner, command: C) -> Self {
        Self {
            runner,
            context: None,
            command,
        }
    }

    /// Read the collection and credentials from `context`.
    #[must_use]
    pub fn with_context(mut self, context: Arc<ServerContextStore>) -> Self {
        self.context = Some(context);
        self
    }
}

#[async_trait]
impl<C: ToolCommand> OperationWork for CommandOperation<C> {
    type Inputs = EmptyInputs;
    type Output = C::Output;

    fn name(&self) -> &'static str {
        self.command.name()
    }

    async fn execute(
        &self,
        _inputs: EmptyInputs,
        sink: &ResultSink<C::Output>,
    ) -> Result<(), OperationError> {
        let context = self.context.as_ref().map(|store| store.snapshot());
        debug!(command = self.command.name(), "executing command operation");
        let output = self.runner.run(&self.command, context.as_ref()).await?;
        sink.publish(output);
        Ok(())
    }
}
