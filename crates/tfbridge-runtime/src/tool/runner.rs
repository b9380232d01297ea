//! Launches the command-line tool and supervises it.
//!
//! A started runner owns four tasks: a reader per output stream, a waiter
//! for process exit, and a dispatcher that delivers their events to the
//! [`ToolListener`] one at a time.
//!
//! By default the waiter reports completion as soon as the process exits,
//! so `on_completed` can arrive before the readers have drained buffered
//! output. Set [`ToolRunnerOptions::with_wait_for_output`] to hold
//! completion until both readers reach end of stream.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tfbridge_core::{StreamKind, ToolError};
use tokio::process::{Child, Command};
use tokio::runtime::Handle;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::listener::ToolListener;
use super::stream::{ToolEvent, read_lines};
use crate::args::ArgumentBuilder;

/// Launch options.
#[derive(Debug, Clone, Default)]
pub struct ToolRunnerOptions {
    wait_for_output: bool,
    kill_on_drop: bool,
    working_dir: Option<PathBuf>,
    env: Vec<(String, String)>,
}

impl ToolRunnerOptions {
    /// Default options: completion is not held for output.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Deliver `on_completed` only after both streams are drained.
    #[must_use]
    pub const fn with_wait_for_output(mut self, wait: bool) -> Self {
        self.wait_for_output = wait;
        self
    }

    /// Kill the process when its waiter is dropped (on dispose or when the
    /// runner is dropped). Off by default: disposal leaves the process alone.
    #[must_use]
    pub const fn with_kill_on_drop(mut self, kill: bool) -> Self {
        self.kill_on_drop = kill;
        self
    }

    /// Run the tool in `dir`.
    #[must_use]
    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    /// Set an environment variable for the child.
    #[must_use]
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    /// Whether completion waits for output.
    pub const fn wait_for_output(&self) -> bool {
        self.wait_for_output
    }
}

/// Handle to a launched tool process.
#[derive(Debug)]
pub struct ToolHandle {
    pid: Option<u32>,
    kill: Mutex<Option<oneshot::Sender<()>>>,
}

impl ToolHandle {
    /// OS process id, if still known at launch.
    pub const fn pid(&self) -> Option<u32> {
        self.pid
    }

    /// Ask the waiter to kill the process. Has no effect once the process
    /// has exited or the runner has been disposed.
    pub fn kill(&self) {
        let tx = self.kill.lock().unwrap_or_else(PoisonError::into_inner).take();
        if let Some(tx) = tx {
            let _ = tx.send(());
        }
    }
}

/// Runs one invocation of the command-line tool.
pub struct ToolRunner {
    tool: PathBuf,
    args: ArgumentBuilder,
    options: ToolRunnerOptions,
    started: Mutex<bool>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl ToolRunner {
    /// Prepare an invocation of `tool` with `args`.
    pub fn new(tool: impl Into<PathBuf>, args: ArgumentBuilder) -> Self {
        Self {
            tool: tool.into(),
            args,
            options: ToolRunnerOptions::default(),
            started: Mutex::new(false),
            tasks: Mutex::new(Vec::new()),
        }
    }

    /// Replace the launch options.
    #[must_use]
    pub fn with_options(mut self, options: ToolRunnerOptions) -> Self {
        self.options = options;
        self
    }

    /// Tool path.
    pub fn tool(&self) -> &Path {
        &self.tool
    }

    /// Argument list.
    pub const fn args(&self) -> &ArgumentBuilder {
        &self.args
    }

    fn tasks(&self) -> MutexGuard<'_, Vec<JoinHandle<()>>> {
        self.tasks.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Launch the tool and start supervising it.
    ///
    /// If the launch fails, `listener.on_exception` is called before this
    /// returns, no tasks are started and `None` is returned. A runner
    /// launches at most once.
    pub fn start(&self, listener: Arc<dyn ToolListener>) -> Option<ToolHandle> {
        match self.spawn() {
            Ok((child, handle)) => Some(self.supervise(child, &handle, listener)),
            Err(e) => {
                warn!(tool = %self.tool.display(), error = %e, "tool launch failed");
                listener.on_exception(&e);
                None
            }
        }
    }

    fn spawn(&self) -> Result<(Child, Handle), ToolError> {
        let launch_failed = |reason: String| ToolError::LaunchFailed {
            tool: self.tool.clone(),
            reason,
        };

        let handle =
            Handle::try_current().map_err(|e| launch_failed(format!("no async runtime: {e}")))?;

        {
            let mut started = self.started.lock().unwrap_or_else(PoisonError::into_inner);
            if *started {
                return Err(launch_failed("tool runner already started".to_string()));
            }
            *started = true;
        }

        info!(tool = %self.tool.display(), args = %self.args, "launching tool");

        let mut command = Command::new(&self.tool);
        command
            .args(self.args.build())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(self.options.kill_on_drop);
        if let Some(ref dir) = self.options.working_dir {
            command.current_dir(dir);
        }
        for (key, value) in &self.options.env {
            command.env(key, value);
        }

        // Spawning registers the child with the reactor of the current runtime
        let _guard = handle.enter();
        let child = command.spawn().map_err(|e| launch_failed(e.to_string()))?;
        Ok((child, handle))
    }

    fn supervise(&self, mut child: Child, handle: &Handle, listener: Arc<dyn ToolListener>) -> ToolHandle {
        let pid = child.id();
        debug!(tool = %self.tool.display(), ?pid, "tool started");

        let (events_tx, mut events_rx) = mpsc::unbounded_channel();
        let (kill_tx, kill_rx) = oneshot::channel();
        let mut drained = Vec::with_capacity(2);
        let mut tasks = Vec::with_capacity(4);

        if let Some(stdout) = child.stdout.take() {
            let (done_tx, done_rx) = oneshot::channel::<()>();
            drained.push(done_rx);
            let events = events_tx.clone();
            tasks.push(handle.spawn(async move {
                read_lines(stdout, StreamKind::Stdout, events).await;
                let _ = done_tx.send(());
            }));
        }
        if let Some(stderr) = child.stderr.take() {
            let (done_tx, done_rx) = oneshot::channel::<()>();
            drained.push(done_rx);
            let events = events_tx.clone();
            tasks.push(handle.spawn(async move {
                read_lines(stderr, StreamKind::Stderr, events).await;
                let _ = done_tx.send(());
            }));
        }

        let wait_for_output = self.options.wait_for_output;
        let events = events_tx;
        tasks.push(handle.spawn(async move {
            let status = tokio::select! {
                status = child.wait() => status,
                Ok(()) = kill_rx => {
                    debug!(?pid, "killing tool process");
                    if let Err(e) = child.start_kill() {
                        warn!(?pid, error = %e, "failed to kill tool process");
                    }
                    child.wait().await
                }
            };

            if wait_for_output {
                for done in drained {
                    // A reader aborted by dispose drops its sender
                    let _ = done.await;
                }
            }

            let event = match status {
                Ok(status) => {
                    debug!(?pid, code = ?status.code(), "tool exited");
                    ToolEvent::Completed(status.code())
                }
                Err(e) => ToolEvent::Exception(ToolError::Wait {
                    reason: e.to_string(),
                }),
            };
            let _ = events.send(event);
        }));

        tasks.push(handle.spawn(async move {
            while let Some(event) = events_rx.recv().await {
                match event {
                    ToolEvent::Line {
                        stream: StreamKind::Stdout,
                        line,
                    } => listener.on_stdout(&line),
                    ToolEvent::Line {
                        stream: StreamKind::Stderr,
                        line,
                    } => listener.on_stderr(&line),
                    ToolEvent::Exception(e) => listener.on_exception(&e),
                    ToolEvent::Completed(code) => listener.on_completed(code),
                }
            }
        }));

        self.tasks().extend(tasks);

        ToolHandle {
            pid,
            kill: Mutex::new(Some(kill_tx)),
        }
    }

    /// Interrupt and join every supervision task still running.
    ///
    /// Safe to call repeatedly, before `start` or after a failed launch.
    /// The process itself is not killed unless the runner was configured
    /// with [`ToolRunnerOptions::with_kill_on_drop`]; otherwise use
    /// [`ToolHandle::kill`] first if it must not outlive the runner.
    pub async fn dispose(&self) {
        let tasks = std::mem::take(&mut *self.tasks());
        if tasks.is_empty() {
            return;
        }
        debug!(tool = %self.tool.display(), tasks = tasks.len(), "disposing tool runner");
        for task in &tasks {
            task.abort();
        }
        for task in tasks {
            // Cancelled is the expected outcome for tasks still running
            if let Err(e) = task.await {
                if e.is_panic() {
                    warn!(tool = %self.tool.display(), "tool supervision task panicked");
                }
            }
        }
    }
}

impl Drop for ToolRunner {
    fn drop(&mut self) {
        for task in self.tasks().drain(..) {
            task.abort();
        }
    }
}
