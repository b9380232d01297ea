//! Command-line tool execution for tfbridge.
//!
//! - [`args`]: argument lists with secret masking for logs
//! - [`tool`]: process launch and supervision with streaming callbacks
//! - [`command`]: typed commands, output parsers, and their adapters to the
//!   core operation framework and workspace batcher
#![deny(unused_crate_dependencies)]

pub mod args;
pub mod command;
pub mod tool;

pub use args::{ArgumentBuilder, SECRET_MASK};
pub use command::{
    CommandOperation, CommandRunner, LineParser, OutputParser, RawOutputParser, StatusCommand,
    StatusDelegate, ToolCommand, authorization_failure, base_arguments,
};
pub use tool::{
    CollectingListener, TOOL_PATH_ENV, ToolHandle, ToolListener, ToolOutput, ToolRunner,
    ToolRunnerOptions, locate_tool,
};
