//! Configuration commands.

use crate::config::EventflowConfig;
use crate::error::{CliError, CliResult};

/// Dump the effective configuration to stdout.
pub fn dump(config: &EventflowConfig) -> CliResult<()> {
    let toml_str = toml::to_string_pretty(config)
        .map_err(|e| CliError::Config(format!("failed to serialize config: {}", e)))?;
    println!("# config.toml ({})", EventflowConfig::default_path().display());
    println!("{}", toml_str);

    Ok(())
}

/// Validate the configuration.
pub fn validate(config: &EventflowConfig) -> CliResult<()> {
    config.validate()?;
    println!(
        "Configuration is valid: {} list calendars, {} schedules, page cap {}.",
        config.sources.general.len(),
        config.sources.athletics.len(),
        config.sources.page_cap
    );
    Ok(())
}

/// Show the configuration file path.
pub fn path() -> CliResult<()> {
    let config_path = EventflowConfig::default_path();
    println!("config: {}", config_path.display());
    Ok(())
}
