//! Process supervision for the command-line tool.
//!
//! - [`ToolRunner`]: launches the tool, reads both streams and waits for exit
//! - [`ToolListener`]: callbacks for lines, failures and completion
//! - [`CollectingListener`]: buffers a whole invocation for callers that
//!   only need the final output
//! - [`locate_tool`]: finds the executable

mod listener;
mod locate;
mod runner;
mod stream;

pub use listener::{CollectingListener, Finished, ToolListener, ToolOutput};
pub use locate::{TOOL_PATH_ENV, locate_tool};
pub use runner::{ToolHandle, ToolRunner, ToolRunnerOptions};
