//! cfgmgmt - credential compliance reports and rotation for configuration directories

mod cli;
mod commands;
mod config;

use std::process::ExitCode;

use clap::Parser;

use crate::cli::Cli;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let _log_guard = match cfgmgmt_log::init_with(cli.log_config()) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("error: cannot initialise logging: {e}");
            return ExitCode::FAILURE;
        }
    };

    match commands::run(cli).await {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!(error = %e, "command failed");
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}
