//! Typed tool commands.
//!
//! A [`ToolCommand`] contributes its name, its own arguments and a parser
//! for the finished output. Base arguments shared by every command come
//! from [`base_arguments`]:
//!
//! `<name> -noprompt [-collection:<url>] [-login:<user>,<secret>]`
//!
//! The login argument is always marked secret.

mod delegate;
mod operation;
mod parser;
mod runner;
mod status;

pub use delegate::StatusDelegate;
pub use operation::CommandOperation;
pub use parser::{LineParser, OutputParser, RawOutputParser};
pub use runner::CommandRunner;
pub use status::StatusCommand;

use tfbridge_core::{OperationError, ServerContext};

use crate::args::ArgumentBuilder;
use crate::tool::ToolOutput;

/// Stderr fragments the tool prints when credentials are missing or rejected.
const AUTHORIZATION_MARKERS: &[&str] = &["TF30063", "(401)", "Unauthorized"];

/// A command-line tool command with a typed result.
pub trait ToolCommand: Send + Sync + 'static {
    /// Parsed result.
    type Output: Send + Sync + 'static;

    /// Sub-command name, e.g. `status`.
    fn name(&self) -> &'static str;

    /// Append command-specific arguments after the base arguments.
    fn add_arguments(&self, builder: ArgumentBuilder) -> ArgumentBuilder;

    /// Interpret the finished invocation. A non-zero exit code is data.
    fn parse_output(&self, output: &ToolOutput) -> Result<Self::Output, OperationError>;

    /// Full argument list for this command against `context`.
    fn argument_builder(&self, context: Option<&ServerContext>) -> ArgumentBuilder {
        self.add_arguments(base_arguments(self.name(), context))
    }
}

/// Arguments every command starts with.
pub fn base_arguments(name: &str, context: Option<&ServerContext>) -> ArgumentBuilder {
    let mut builder = ArgumentBuilder::new().add(name).add("-noprompt");
    let Some(context) = context else {
        return builder;
    };

    if !context.collection_url.trim().is_empty() {
        builder = builder.add(format!("-collection:{}", context.collection_url));
    }
    if let Some(ref auth) = context.authentication {
        builder = builder.add_secret(format!("-login:{},{}", auth.user_name, auth.secret));
    }
    builder
}

/// Classify tool stderr as an authorization failure.
pub fn authorization_failure(stderr: &str) -> Option<OperationError> {
    AUTHORIZATION_MARKERS
        .iter()
        .any(|marker| stderr.contains(marker))
        .then(|| OperationError::not_authorized(first_line(stderr)))
}

fn first_line(text: &str) -> &str {
    text.lines().map(str::trim).find(|l| !l.is_empty()).unwrap_or_default()
}
