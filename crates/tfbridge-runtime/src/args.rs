//! Argument lists for tool invocations.
//!
//! Arguments marked secret are replaced by [`SECRET_MASK`] whenever the list
//! is rendered for logging. The list handed to the process is never masked.

use std::collections::BTreeSet;
use std::fmt;

/// Placeholder printed in place of a secret argument.
pub const SECRET_MASK: &str = "********";

/// Ordered argument list with per-index secret marking.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct ArgumentBuilder {
    args: Vec<String>,
    secrets: BTreeSet<usize>,
}

impl ArgumentBuilder {
    /// Create an empty list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a plain argument.
    #[must_use]
    pub fn add(mut self, value: impl Into<String>) -> Self {
        self.args.push(value.into());
        self
    }

    /// Append an argument that must never appear in logs.
    #[must_use]
    pub fn add_secret(mut self, value: impl Into<String>) -> Self {
        self.secrets.insert(self.args.len());
        self.args.push(value.into());
        self
    }

    /// Append every item of `values` as a plain argument.
    #[must_use]
    pub fn add_all<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(values.into_iter().map(Into::into));
        self
    }

    /// Number of arguments.
    pub fn len(&self) -> usize {
        self.args.len()
    }

    /// Whether the list is empty.
    pub fn is_empty(&self) -> bool {
        self.args.is_empty()
    }

    /// Whether the argument at `index` is secret.
    pub fn is_secret(&self, index: usize) -> bool {
        self.secrets.contains(&index)
    }

    /// The arguments, unmasked.
    pub fn build(&self) -> Vec<String> {
        self.args.clone()
    }

    /// The arguments with `tool` prepended at index 0.
    pub fn build_with_tool(&self, tool: impl Into<String>) -> Vec<String> {
        let mut argv = Vec::with_capacity(self.args.len() + 1);
        argv.push(tool.into());
        argv.extend(self.args.iter().cloned());
        argv
    }
}

/// Space-joined rendering with secrets masked. For logs only.
impl fmt::Display for ArgumentBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, arg) in self.args.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            if self.is_secret(i) {
                f.write_str(SECRET_MASK)?;
            } else {
                f.write_str(arg)?;
            }
        }
        Ok(())
    }
}

impl fmt::Debug for ArgumentBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ArgumentBuilder")
            .field(&self.to_string())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_builder() {
        let builder = ArgumentBuilder::new();
        assert!(builder.is_empty());
        assert_eq!(builder.to_string(), "");
        assert!(builder.build().is_empty());
        assert_eq!(builder.build_with_tool("tf"), vec!["tf".to_string()]);
    }

    #[test]
    fn test_secret_masked_only_in_display() {
        let builder = ArgumentBuilder::new()
            .add("delete")
            .add("-noprompt")
            .add_secret("-login:user,hunter2")
            .add("/path/to/file.txt");

        assert_eq!(builder.to_string(), "delete -noprompt ******** /path/to/file.txt");
        assert_eq!(builder.build()[2], "-login:user,hunter2");
        assert!(builder.is_secret(2));
        assert!(!builder.is_secret(3));
        assert!(!format!("{builder:?}").contains("hunter2"));
    }

    #[test]
    fn test_mask_positions_follow_secret_indices() {
        let values = ["a0", "s1", "a2", "s3", "s4", "a5"];
        let mut builder = ArgumentBuilder::new();
        for value in values {
            builder = if value.starts_with('s') {
                builder.add_secret(value)
            } else {
                builder.add(value)
            };
        }

        let rendered = builder.to_string();
        let parts: Vec<&str> = rendered.split(' ').collect();
        assert_eq!(parts.len(), values.len());
        for (part, value) in parts.iter().zip(values) {
            if value.starts_with('s') {
                assert_eq!(*part, SECRET_MASK);
            } else {
                assert_eq!(*part, value);
            }
        }
    }

    #[test]
    fn test_build_with_tool_prepends_unmasked() {
        let builder = ArgumentBuilder::new()
            .add_secret("token")
            .add_all(["x", "y"]);
        let argv = builder.build_with_tool("/usr/bin/tf");
        assert_eq!(argv, vec!["/usr/bin/tf", "token", "x", "y"]);
        assert_eq!(argv.len(), builder.len() + 1);
    }
}
