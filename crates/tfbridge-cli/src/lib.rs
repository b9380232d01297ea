//! tfbridge command-line front end.
//!
//! [`bootstrap`] is the composition root; [`dispatch`] routes a parsed
//! [`Cli`] to its handler and returns the process exit code.
#![deny(unused_crate_dependencies)]

pub mod bootstrap;
pub mod commands;
pub mod error;
pub mod handlers;
pub mod logging;
pub mod parser;
pub mod refresher;

pub use bootstrap::{CliContext, bootstrap};
pub use commands::Commands;
pub use error::CliError;
pub use parser::Cli;

use clap::CommandFactory;

/// Load `.env` from the data directory, then from the working directory.
///
/// Variables already set in the process environment are never overridden.
pub fn load_env_files() {
    if let Ok(path) = tfbridge_core::env_file_path() {
        let _ = dotenvy::from_path(path);
    }
    let _ = dotenvy::dotenv();
}

/// Run the parsed command. Returns the exit code on success.
pub async fn dispatch(cli: Cli) -> anyhow::Result<i32> {
    let ctx = bootstrap(&cli)?;

    let Some(command) = cli.command else {
        Cli::command().print_help()?;
        return Ok(0);
    };

    match command {
        Commands::Run {
            wait_for_output,
            args,
        } => return Ok(handlers::run::execute(&ctx, args, wait_for_output).await?),
        Commands::Translate { path } => handlers::translate::execute(&ctx, &path)?,
        Commands::Status { paths } => handlers::status::execute(&ctx, paths).await?,
        Commands::Projects => handlers::projects::execute(&ctx).await?,
        Commands::Paths => handlers::paths::execute(&ctx)?,
    }
    Ok(0)
}

/// Exit code for an error returned by [`dispatch`].
pub fn exit_code_for(error: &anyhow::Error) -> i32 {
    error.downcast_ref::<CliError>().map_or(1, CliError::exit_code)
}
