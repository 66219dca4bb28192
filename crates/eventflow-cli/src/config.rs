//! CLI configuration.
//!
//! All settings live in a single `config.toml` file at
//! `~/.config/eventflow/config.toml` by default. Every section is optional;
//! missing keys take the compiled-in defaults.
//!
//! ```toml
//! [sources]
//! page_cap = 3
//! athletics = ["https://fightingillini.com/sports/football/schedule"]
//!
//! [http]
//! timeout_secs = 15
//!
//! [output]
//! path = "events.json"
//! pretty = true
//! ```

use std::path::{Path, PathBuf};

use eventflow_scrapers::{HttpSettings, SourceConfig};
use serde::{Deserialize, Serialize};

use crate::error::{CliError, CliResult};

/// Configuration for the eventflow CLI.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventflowConfig {
    /// Source URL lists and crawl limits.
    pub sources: SourceConfig,

    /// Fetcher and browser transport settings.
    pub http: HttpSettings,

    /// Where and how results are written.
    pub output: OutputSettings,
}

/// Output sink settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputSettings {
    /// File for the merged events. Stdout when unset.
    pub path: Option<PathBuf>,

    /// Directory for per-source files.
    pub split_dir: Option<PathBuf>,

    /// Pretty-print JSON output.
    pub pretty: bool,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            path: None,
            split_dir: None,
            pretty: true,
        }
    }
}

impl EventflowConfig {
    /// Loads configuration from the default path, or defaults if it does not exist.
    pub fn load() -> CliResult<Self> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Loads configuration from a specific path.
    pub fn load_from(path: &Path) -> CliResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            CliError::Config(format!("failed to read {}: {}", path.display(), e))
        })?;
        toml::from_str(&content).map_err(|e| {
            CliError::Config(format!("failed to parse {}: {}", path.display(), e))
        })
    }

    /// Checks source URLs and transport limits.
    pub fn validate(&self) -> CliResult<()> {
        self.sources.validate()?;
        if self.http.timeout_secs == 0 {
            return Err(CliError::Config("http.timeout_secs must be at least 1".to_string()));
        }
        if self.http.user_agent.trim().is_empty() {
            return Err(CliError::Config("http.user_agent must not be empty".to_string()));
        }
        Ok(())
    }

    /// Returns the default configuration file path.
    pub fn default_path() -> PathBuf {
        Self::default_config_dir().join("config.toml")
    }

    /// Returns the default configuration directory.
    pub fn default_config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("eventflow")
    }
}
