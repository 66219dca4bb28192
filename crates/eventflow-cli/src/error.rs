//! CLI error types.

use std::fmt;

use eventflow_scrapers::{ScrapeError, SourceKind};

/// Result type for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

/// Errors that can occur in the CLI.
#[derive(Debug)]
pub enum CliError {
    /// Configuration error.
    Config(String),
    /// Extractor wiring failed before the run started.
    Scrape(String),
    /// IO error.
    Io(std::io::Error),
    /// Events could not be serialized.
    Serialize(serde_json::Error),
    /// Strict mode: these sources produced no events.
    EmptySources(Vec<SourceKind>),
}

impl CliError {
    /// Process exit status for this error: 2 for a strict-mode failure, 1 otherwise.
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::EmptySources(_) => 2,
            _ => 1,
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(msg) => write!(f, "configuration error: {}", msg),
            Self::Scrape(msg) => write!(f, "scrape error: {}", msg),
            Self::Io(err) => write!(f, "IO error: {}", err),
            Self::Serialize(err) => write!(f, "failed to serialize events: {}", err),
            Self::EmptySources(sources) => {
                let names: Vec<&str> = sources.iter().map(SourceKind::as_str).collect();
                write!(f, "strict mode: no events from {}", names.join(", "))
            }
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Serialize(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<serde_json::Error> for CliError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialize(err)
    }
}

impl From<ScrapeError> for CliError {
    fn from(err: ScrapeError) -> Self {
        match err.code() {
            eventflow_scrapers::ScrapeErrorCode::Configuration => Self::Config(err.to_string()),
            _ => Self::Scrape(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strict_failure_message() {
        let err = CliError::EmptySources(vec![SourceKind::Arena, SourceKind::General]);
        assert_eq!(err.to_string(), "strict mode: no events from arena, general");
    }

    #[test]
    fn exit_codes() {
        assert_eq!(CliError::EmptySources(vec![]).exit_code(), 2);
        assert_eq!(CliError::Config("x".into()).exit_code(), 1);
    }

    #[test]
    fn configuration_errors_stay_configuration_errors() {
        let err: CliError = ScrapeError::configuration("page_cap must be at least 1").into();
        assert!(matches!(err, CliError::Config(_)));
    }
}
