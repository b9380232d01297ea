//! Locating the command-line tool.

use std::env;
use std::path::{Path, PathBuf};

use tfbridge_core::ToolError;
use tracing::debug;

/// Environment variable naming the tool executable.
pub const TOOL_PATH_ENV: &str = "TF_CLI_PATH";

/// Executable names searched on `PATH`.
const TOOL_NAMES: &[&str] = &["tf", "tf.cmd"];

/// Resolve the tool executable.
///
/// Resolution order:
/// 1. `explicit` (from settings or the command line)
/// 2. `TF_CLI_PATH` environment variable
/// 3. `tf` on `PATH`
///
/// An explicit or environment path must point at an existing file.
pub fn locate_tool(explicit: Option<&str>) -> Result<PathBuf, ToolError> {
    if let Some(path) = explicit.map(str::trim).filter(|p| !p.is_empty()) {
        return existing(Path::new(path), "configured tool path");
    }

    if let Ok(path) = env::var(TOOL_PATH_ENV) {
        if !path.trim().is_empty() {
            return existing(Path::new(path.trim()), TOOL_PATH_ENV);
        }
    }

    for name in TOOL_NAMES {
        if let Ok(path) = which::which(name) {
            debug!(path = %path.display(), "found tool on PATH");
            return Ok(path);
        }
    }

    Err(ToolError::NotFound {
        hint: format!("'tf' is not on PATH; set {TOOL_PATH_ENV} or the tool_path setting"),
    })
}

fn existing(path: &Path, source: &str) -> Result<PathBuf, ToolError> {
    if path.is_file() {
        debug!(path = %path.display(), source, "using tool path");
        Ok(path.to_path_buf())
    } else {
        Err(ToolError::NotFound {
            hint: format!("{source} {} does not exist", path.display()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_explicit_path_must_exist() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("tf");
        let err = locate_tool(missing.to_str()).unwrap_err();
        assert!(matches!(err, ToolError::NotFound { .. }));
    }

    #[test]
    fn test_explicit_path_wins() {
        let dir = tempdir().unwrap();
        let tool = dir.path().join("tf");
        std::fs::write(&tool, "").unwrap();
        assert_eq!(locate_tool(tool.to_str()).unwrap(), tool);
    }
}
