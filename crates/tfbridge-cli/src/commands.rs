//! Subcommands.

use std::path::PathBuf;

use clap::Subcommand;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the command-line tool with raw arguments, streaming its output
    Run {
        /// Report completion only after all output has been printed
        #[arg(long)]
        wait_for_output: bool,

        /// Arguments passed to the tool
        #[arg(trailing_var_arg = true, allow_hyphen_values = true, required = true)]
        args: Vec<String>,
    },

    /// Translate a local path to its server path, or a server path (`$/...`)
    /// to its local path, using the known workspaces
    Translate {
        /// Local or server path
        path: String,
    },

    /// Pending changes for local paths, one tool invocation per workspace
    Status {
        /// Local paths
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },

    /// List the team projects of the collection
    Projects,

    /// Show resolved data and settings paths
    Paths,
}
