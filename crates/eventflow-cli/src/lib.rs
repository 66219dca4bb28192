//! Command-line front end for eventflow.
//!
//! This crate provides the `eventflow` binary: configuration loading, the
//! `scrape` run with its JSON sinks, and the calendar-import export.

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod export;

pub use cli::Cli;
pub use error::{CliError, CliResult};
