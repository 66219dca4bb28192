//! eventflow CLI entry point.

use std::process::ExitCode;

use clap::Parser;
use eventflow_core::{TracingConfig, TracingOutputFormat, init_tracing};
use tracing::Level;

use eventflow_cli::cli::{Cli, Command, ConfigAction, LogFormat};
use eventflow_cli::config::EventflowConfig;
use eventflow_cli::error::CliResult;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let mut log_config = match cli.log_format {
        LogFormat::Json => TracingConfig::scheduled(),
        LogFormat::Pretty => TracingConfig::default().with_format(TracingOutputFormat::Pretty),
        LogFormat::Compact if cli.debug => TracingConfig::cli_debug(),
        LogFormat::Compact => TracingConfig::default(),
    };
    if cli.debug {
        log_config = log_config.with_level(Level::DEBUG);
    }
    if let Err(e) = init_tracing(log_config) {
        eprintln!("warning: {}", e);
    }

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::from(e.exit_code())
        }
    }
}

async fn run(cli: Cli) -> CliResult<()> {
    let config = match cli.config {
        Some(ref path) => EventflowConfig::load_from(path)?,
        None => EventflowConfig::load()?,
    };

    match cli.command {
        Command::Scrape(ref args) => eventflow_cli::commands::scrape::run(&config, args).await,
        Command::Config { action } => match action {
            ConfigAction::Dump => eventflow_cli::commands::config::dump(&config),
            ConfigAction::Validate => eventflow_cli::commands::config::validate(&config),
            ConfigAction::Path => eventflow_cli::commands::config::path(),
        },
    }
}
