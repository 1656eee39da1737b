//! CLI entry point for economist-audio.

use std::process::ExitCode;

use clap::Parser;
use tracing::{debug, error};

mod app;
mod cli;

use app::config::{effective_log_level, resolve_config};
use app::{commands, terminal};
use cli::Cli;

#[tokio::main]
async fn main() -> ExitCode {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let cli = Cli::parse();

    let config = match resolve_config(&cli) {
        Ok(config) => config,
        Err(err) => {
            terminal::init_tracing("error", false);
            error!("{err:#}");
            return ExitCode::FAILURE;
        }
    };

    let command = cli.effective_command();
    let level = effective_log_level(&cli, &command, config.log_level);
    terminal::init_tracing(level.as_str(), cli.quiet || level != config.log_level);
    debug!(
        command = ?command,
        proxy = config.proxy_url.is_some(),
        timeout = ?config.timeout,
        "Configuration resolved"
    );

    match commands::run_command(&command, &config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err:#}");
            ExitCode::FAILURE
        }
    }
}
