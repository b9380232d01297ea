//! Main CLI parser and global options.

use clap::Parser;

use crate::commands::Commands;

/// Command-line interface for tfbridge.
#[derive(Parser, Debug)]
#[command(name = "tfbridge")]
#[command(about = "Drive the version-control command-line tool and REST API")]
#[command(version)]
pub struct Cli {
    /// Collection URL (overrides settings)
    #[arg(long, global = true, env = "TFBRIDGE_COLLECTION_URL")]
    pub collection: Option<String>,

    /// User name sent with the token
    #[arg(long, global = true, env = "TFBRIDGE_USERNAME")]
    pub username: Option<String>,

    /// Personal access token or password
    #[arg(long, global = true, env = "TFBRIDGE_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Path to the command-line tool (overrides settings)
    #[arg(long, global = true)]
    pub tool: Option<String>,

    /// Enable verbose/debug output
    #[arg(short = 'v', long = "verbose", global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}
