//! CLI entry point.

use std::process::ExitCode;

use clap::Parser;
use tfbridge_cli::{Cli, dispatch, exit_code_for, load_env_files, logging};

#[tokio::main]
async fn main() -> ExitCode {
    // Before parsing, so `.env` values feed the clap env fallbacks
    load_env_files();
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let code = match dispatch(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e:#}");
            exit_code_for(&e)
        }
    };
    ExitCode::from(u8::try_from(code.clamp(0, 255)).unwrap_or(1))
}
