//! `run`: invoke the tool with raw arguments and stream its output.

use std::sync::{Arc, Mutex, PoisonError};

use tfbridge_core::ToolError;
use tfbridge_runtime::{ArgumentBuilder, ToolListener, ToolRunner, ToolRunnerOptions, locate_tool};
use tokio::sync::oneshot;
use tracing::warn;

use crate::bootstrap::CliContext;
use crate::error::CliError;

/// Prints each line as it arrives and resolves once the process is done.
struct PrintingListener {
    done: Mutex<Option<oneshot::Sender<Result<Option<i32>, ToolError>>>>,
}

impl PrintingListener {
    fn finish(&self, result: Result<Option<i32>, ToolError>) {
        let tx = self.done.lock().unwrap_or_else(PoisonError::into_inner).take();
        if let Some(tx) = tx {
            let _ = tx.send(result);
        }
    }
}

impl ToolListener for PrintingListener {
    fn on_stdout(&self, line: &str) {
        println!("{line}");
    }

    fn on_stderr(&self, line: &str) {
        eprintln!("{line}");
    }

    fn on_exception(&self, error: &ToolError) {
        if matches!(error, ToolError::StreamIo { .. }) {
            warn!(error = %error, "Output stream failed");
            return;
        }
        self.finish(Err(error.clone()));
    }

    fn on_completed(&self, exit_code: Option<i32>) {
        self.finish(Ok(exit_code));
    }
}

/// Execute the run command. Returns the tool's exit code.
///
/// Unless output is waited for (flag or `wait_for_output` setting), the
/// trailing output of a fast-exiting tool can be cut off.
pub async fn execute(ctx: &CliContext, args: Vec<String>, wait_for_output: bool) -> Result<i32, CliError> {
    let tool = locate_tool(ctx.tool_path())?;
    let wait = wait_for_output || ctx.settings.wait_for_output.unwrap_or(false);
    let runner = ToolRunner::new(tool, ArgumentBuilder::new().add_all(args))
        .with_options(ToolRunnerOptions::new().with_wait_for_output(wait));

    let (tx, rx) = oneshot::channel();
    let listener = Arc::new(PrintingListener {
        done: Mutex::new(Some(tx)),
    });
    // On launch failure the listener has already been told
    let _handle = runner.start(listener);

    let result = rx.await.unwrap_or_else(|_| {
        Err(ToolError::Wait {
            reason: "tool supervision ended without completion".to_string(),
        })
    });
    // Without waiting for output, lines still buffered at exit may be dropped here
    runner.dispose().await;

    // Signal termination maps to the conventional shell code
    Ok(result?.unwrap_or(128))
}
