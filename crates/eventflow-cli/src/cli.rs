//! Command-line interface definition.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use eventflow_scrapers::SourceKind;

/// eventflow - Scrape campus event calendars into one normalized feed
#[derive(Debug, Parser)]
#[command(name = "eventflow")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(long, short, env = "EVENTFLOW_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Enable debug output
    #[arg(long, short = 'v', global = true)]
    pub debug: bool,

    /// Log line format
    #[arg(long, value_enum, default_value_t = LogFormat::Compact, global = true)]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run one aggregation and write the events
    Scrape(ScrapeArgs),

    /// Configuration commands
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Options for a scrape run.
#[derive(Debug, Clone, Default, Args)]
pub struct ScrapeArgs {
    /// Write the merged events here instead of stdout
    #[arg(long, short)]
    pub output: Option<PathBuf>,

    /// Also write one `<source>.json` per source into this directory
    #[arg(long)]
    pub split_dir: Option<PathBuf>,

    /// Only run these sources (can be repeated)
    #[arg(long, action = clap::ArgAction::Append)]
    pub only: Vec<SourceKind>,

    /// Output shape
    #[arg(long, value_enum, default_value_t = ExportFormat::Raw)]
    pub format: ExportFormat,

    /// Exit with status 2 if any selected source produced no events
    #[arg(long, env = "EVENTFLOW_STRICT")]
    pub strict: bool,

    /// Skip fetching detail pages for list-calendar entries
    #[arg(long)]
    pub no_details: bool,
}

/// Shape of the written events.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum ExportFormat {
    /// Id-keyed event records
    #[default]
    Raw,
    /// Records split into date and time fields for calendar import
    CalendarImport,
}

/// Log line format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    #[default]
    Compact,
    Pretty,
    Json,
}

/// Configuration actions.
#[derive(Debug, Subcommand)]
pub enum ConfigAction {
    /// Dump the effective configuration
    Dump,
    /// Validate the configuration
    Validate,
    /// Show the configuration file path
    Path,
}
