//! `status` command.

use tfbridge_core::OperationError;

use super::ToolCommand;
use super::parser::{OutputParser, RawOutputParser};
use crate::args::ArgumentBuilder;
use crate::tool::ToolOutput;

/// `status -format:xml -recursive [-workspace:<name>] [items...]`.
#[derive(Debug, Clone)]
pub struct StatusCommand<P = RawOutputParser> {
    items: Vec<String>,
    workspace: Option<String>,
    parser: P,
}

impl StatusCommand<RawOutputParser> {
    /// Status of `items` (local or server paths), raw output.
    pub fn new<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            items: items.into_iter().map(Into::into).collect(),
            workspace: None,
            parser: RawOutputParser,
        }
    }
}

impl<P: OutputParser> StatusCommand<P> {
    /// Restrict to `workspace`.
    #[must_use]
    pub fn with_workspace(mut self, workspace: impl Into<String>) -> Self {
        self.workspace = Some(workspace.into());
        self
    }

    /// Swap the output parser.
    pub fn with_parser<Q: OutputParser>(self, parser: Q) -> StatusCommand<Q> {
        StatusCommand {
            items: self.items,
            workspace: self.workspace,
            parser,
        }
    }

    /// Requested items.
    pub fn items(&self) -> &[String] {
        &self.items
    }
}

impl<P: OutputParser> ToolCommand for StatusCommand<P> {
    type Output = P::Output;

    fn name(&self) -> &'static str {
        "status"
    }

    fn add_arguments(&self, builder: ArgumentBuilder) -> ArgumentBuilder {
        let builder = builder.add("-format:xml").add("-recursive");
        let builder = match self.workspace {
            Some(ref ws) => builder.add(format!("-workspace:{ws}")),
            None => builder,
        };
        builder.add_all(self.items.iter().cloned())
    }

    fn parse_output(&self, output: &ToolOutput) -> Result<P::Output, OperationError> {
        self.parser.parse(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::LineParser;
    use tfbridge_core::{AuthenticationInfo, ServerContext};

    #[test]
    fn test_arguments_without_context() {
        let cmd = StatusCommand::new(["/path/to/file.txt"]);
        assert_eq!(
            cmd.argument_builder(None).to_string(),
            "status -noprompt -format:xml -recursive /path/to/file.txt"
        );
    }

    #[test]
    fn test_arguments_with_workspace_and_login() {
        let url = "http://server:8080/tfs/defaultcollection";
        let ctx = ServerContext::new(url).with_authentication(AuthenticationInfo::new("u", "p", url));
        let cmd = StatusCommand::new(["$/Proj/a", "$/Proj/b"]).with_workspace("ws1");

        assert_eq!(
            cmd.argument_builder(Some(&ctx)).to_string(),
            "status -noprompt -collection:http://server:8080/tfs/defaultcollection ******** \
             -format:xml -recursive -workspace:ws1 $/Proj/a $/Proj/b"
        );
    }

    #[test]
    fn test_parser_is_pluggable() {
        let cmd = StatusCommand::new(Vec::<String>::new()).with_parser(LineParser);
        let lines = cmd
            .parse_output(&ToolOutput {
                stdout: "<status>\n</status>".into(),
                stderr: String::new(),
                exit_code: Some(0),
            })
            .unwrap();
        assert_eq!(lines.len(), 2);
    }
}
