mod cli;
mod commands;
mod error;
mod extractor;
mod mcp;
mod naming;
mod pattern;
mod pdf;
mod segmenter;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};
use error::SplitError;
use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            match e.downcast_ref::<SplitError>() {
                Some(err) => {
                    log::debug!("{:?} error, exit code {}", err.kind(), err.exit_code());
                    ExitCode::from(err.exit_code())
                }
                None => ExitCode::FAILURE,
            }
        }
    }
}

/// Logs go to stderr so stdout stays usable for the MCP transport.
fn init_logging(verbose: bool) {
    let level = if verbose { "info" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();
}

async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Mcp => {
            mcp::run_server().await?;
        }
        Commands::Split(args) => {
            commands::split::run(&args.into())?;
        }
        Commands::Keys {
            pattern,
            path,
            key_group,
            ignore_case,
            text_engine,
        } => {
            commands::keys::run(&path, &pattern, key_group, ignore_case, text_engine)?;
        }
    }

    Ok(())
}
