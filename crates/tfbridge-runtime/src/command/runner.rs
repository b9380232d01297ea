//! Runs a command to completion and collects its output.

use std::path::{Path, PathBuf};
use std::time::Duration;

use tfbridge_core::{OperationError, ServerContext, ToolError};
use tokio::sync::oneshot;
use tracing::{debug, warn};

use super::{ToolCommand, authorization_failure};
use crate::args::ArgumentBuilder;
use crate::tool::{CollectingListener, Finished, ToolOutput, ToolRunner, ToolRunnerOptions};

/// Executes tool commands and waits for their full output.
///
/// Unlike a bare [`ToolRunner`], completion here always happens after both
/// output streams have been drained, and the process is killed if the run
/// is abandoned (timeout or a dropped future).
#[derive(Debug, Clone)]
pub struct CommandRunner {
    tool: PathBuf,
    timeout: Option<Duration>,
    options: ToolRunnerOptions,
}

impl CommandRunner {
    /// Run commands with the tool at `tool`.
    pub fn new(tool: impl Into<PathBuf>) -> Self {
        Self {
            tool: tool.into(),
            timeout: None,
            options: ToolRunnerOptions::new(),
        }
    }

    /// Kill and fail any invocation that runs longer than `timeout`.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Run the tool in `dir`.
    #[must_use]
    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.options = self.options.with_working_dir(dir);
        self
    }

    /// Tool path.
    pub fn tool(&self) -> &Path {
        &self.tool
    }

    /// Run `args` and collect the output. A non-zero exit code is not an error.
    pub async fn run_raw(&self, args: ArgumentBuilder) -> Result<ToolOutput, ToolError> {
        let runner = ToolRunner::new(&self.tool, args)
            .with_options(
            self.options
                .clone()
                .with_wait_for_output(true)
                .with_kill_on_drop(true),
        );
        let (listener, finished) = CollectingListener::new();

        let result = match runner.start(listener.clone()) {
            Some(_handle) => self.wait(finished).await,
            // The launch failure has already resolved `finished`
            None => finished.await.unwrap_or_else(|_| {
                Err(ToolError::LaunchFailed {
                    tool: self.tool.clone(),
                    reason: "launch failed".to_string(),
                })
            }),
        };
        runner.dispose().await;

        let exit_code = result?;
        if let Some(error) = listener.stream_errors().into_iter().next() {
            return Err(error);
        }
        Ok(listener.output(exit_code))
    }

    async fn wait(&self, finished: oneshot::Receiver<Finished>) -> Finished {
        let lost = || ToolError::Wait {
            reason: "tool supervision ended without completion".to_string(),
        };

        let Some(timeout) = self.timeout else {
            return finished.await.unwrap_or_else(|_| Err(lost()));
        };
        match tokio::time::timeout(timeout, finished).await {
            Ok(received) => received.unwrap_or_else(|_| Err(lost())),
            Err(_) => {
                // Dispose drops the child, which kills it
                warn!(tool = %self.tool.display(), seconds = timeout.as_secs(), "tool timed out");
                Err(ToolError::Timeout {
                    seconds: timeout.as_secs(),
                })
            }
        }
    }

    /// Run `command` against `context` and parse its output.
    ///
    /// Stderr that signals rejected credentials becomes
    /// [`OperationError::NotAuthorized`] before the command's parser runs.
    pub async fn run<C: ToolCommand>(
        &self,
        command: &C,
        context: Option<&ServerContext>,
    ) -> Result<C::Output, OperationError> {
        let args = command.argument_builder(context);
        let output = self.run_raw(args).await?;
        debug!(
            command = command.name(),
            exit_code = ?output.exit_code,
            stdout_bytes = output.stdout.len(),
            stderr_bytes = output.stderr.len(),
            "command finished"
        );

        if let Some(error) = authorization_failure(&output.stderr) {
            return Err(error);
        }
        command.parse_output(&output)
    }
}
