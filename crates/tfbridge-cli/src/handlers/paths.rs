//! `paths`: show resolved file locations.

use tfbridge_core::{data_root, env_file_path, settings_path, workspaces_path};

use crate::bootstrap::CliContext;
use crate::error::CliError;

/// Execute the paths command, printing `key = value` lines.
pub fn execute(ctx: &CliContext) -> Result<(), CliError> {
    println!("data_root = {}", data_root()?.display());
    println!("settings = {}", settings_path()?.display());
    println!("env_file = {}", env_file_path()?.display());
    match ctx.settings.workspaces_file {
        Some(ref file) => println!("workspaces = {file}"),
        None => println!("workspaces = {}", workspaces_path()?.display()),
    }
    println!("tool = {}", ctx.tool_path().unwrap_or("(search TF_CLI_PATH, then PATH)"));
    Ok(())
}
