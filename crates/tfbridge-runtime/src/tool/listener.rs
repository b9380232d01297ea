//! Tool runner callbacks.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tfbridge_core::ToolError;
use tokio::sync::oneshot;

/// Receives a tool invocation's output and lifecycle.
///
/// Callbacks are delivered one at a time from a dispatcher task. Lines of one
/// stream arrive in stream order; stdout and stderr interleave arbitrarily.
/// Unless the runner waits for output, `on_completed` may arrive before the
/// last output lines.
pub trait ToolListener: Send + Sync {
    /// One line of standard output, without its line terminator.
    fn on_stdout(&self, line: &str);

    /// One line of standard error, without its line terminator.
    fn on_stderr(&self, line: &str);

    /// A launch, stream or wait failure.
    fn on_exception(&self, error: &ToolError);

    /// The process exited. `None` when it was terminated by a signal.
    fn on_completed(&self, exit_code: Option<i32>);
}

/// Everything a finished invocation produced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolOutput {
    /// Standard output lines joined with `\n`.
    pub stdout: String,
    /// Standard error lines joined with `\n`.
    pub stderr: String,
    /// Raw exit code; `None` when killed by a signal.
    pub exit_code: Option<i32>,
}

impl ToolOutput {
    /// Whether the tool exited with code 0.
    pub const fn success(&self) -> bool {
        matches!(self.exit_code, Some(0))
    }
}

#[derive(Default)]
struct Collected {
    stdout: Vec<String>,
    stderr: Vec<String>,
    stream_errors: Vec<ToolError>,
}

/// Result of waiting for a collecting listener.
pub type Finished = Result<Option<i32>, ToolError>;

/// Buffers all output and signals once the invocation is over.
///
/// Completion is signalled by `on_completed`, or by a launch or wait
/// failure, whichever comes first.
pub struct CollectingListener {
    collected: Mutex<Collected>,
    finished: Mutex<Option<oneshot::Sender<Finished>>>,
}

impl CollectingListener {
    /// Create a listener and the receiver resolved when the invocation ends.
    pub fn new() -> (Arc<Self>, oneshot::Receiver<Finished>) {
        let (tx, rx) = oneshot::channel();
        let listener = Arc::new(Self {
            collected: Mutex::new(Collected::default()),
            finished: Mutex::new(Some(tx)),
        });
        (listener, rx)
    }

    fn collected(&self) -> MutexGuard<'_, Collected> {
        self.collected.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn finish(&self, result: Finished) {
        let tx = self
            .finished
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(tx) = tx {
            let _ = tx.send(result);
        }
    }

    /// Output gathered so far, paired with `exit_code`.
    pub fn output(&self, exit_code: Option<i32>) -> ToolOutput {
        let collected = self.collected();
        ToolOutput {
            stdout: collected.stdout.join("\n"),
            stderr: collected.stderr.join("\n"),
            exit_code,
        }
    }

    /// Stream read failures reported so far.
    pub fn stream_errors(&self) -> Vec<ToolError> {
        self.collected().stream_errors.clone()
    }
}

impl ToolListener for CollectingListener {
    fn on_stdout(&self, line: &str) {
        self.collected().stdout.push(line.to_string());
    }

    fn on_stderr(&self, line: &str) {
        self.collected().stderr.push(line.to_string());
    }

    fn on_exception(&self, error: &ToolError) {
        match error {
            ToolError::StreamIo { .. } => self.collected().stream_errors.push(error.clone()),
            _ => self.finish(Err(error.clone())),
        }
    }

    fn on_completed(&self, exit_code: Option<i32>) {
        self.finish(Ok(exit_code));
    }
}
