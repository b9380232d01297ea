//! Pluggable output parsers.

use tfbridge_core::OperationError;

use crate::tool::ToolOutput;

/// Turns a finished invocation into a typed value.
pub trait OutputParser: Send + Sync + 'static {
    /// Parsed value.
    type Output: Send + Sync + 'static;

    /// Parse `output`.
    fn parse(&self, output: &ToolOutput) -> Result<Self::Output, OperationError>;
}

/// Hands back the raw output untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct RawOutputParser;

impl OutputParser for RawOutputParser {
    type Output = ToolOutput;

    fn parse(&self, output: &ToolOutput) -> Result<ToolOutput, OperationError> {
        Ok(output.clone())
    }
}

/// Splits stdout into trimmed, non-empty lines.
#[derive(Debug, Clone, Copy, Default)]
pub struct LineParser;

impl OutputParser for LineParser {
    type Output = Vec<String>;

    fn parse(&self, output: &ToolOutput) -> Result<Vec<String>, OperationError> {
        Ok(output
            .stdout
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn output(stdout: &str) -> ToolOutput {
        ToolOutput {
            stdout: stdout.to_string(),
            stderr: String::new(),
            exit_code: Some(1),
        }
    }

    #[test]
    fn test_raw_parser_keeps_everything() {
        let out = output("a\n\n b ");
        assert_eq!(RawOutputParser.parse(&out).unwrap(), out);
    }

    #[test]
    fn test_line_parser_skips_blank_lines() {
        let lines = LineParser.parse(&output("/path/to:\n\n  file.txt  \r\nfile2.txt")).unwrap();
        assert_eq!(lines, vec!["/path/to:", "file.txt", "file2.txt"]);
    }
}
