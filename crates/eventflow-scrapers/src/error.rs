//! Error types for fetching and extraction.
//!
//! Every failure here is scoped to one unit of work (a page, a detail page,
//! an entry). Extractors log it and move on; nothing propagates past an
//! extractor.

use std::fmt;
use thiserror::Error;

/// The category of a scrape error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScrapeErrorCode {
    /// Connection failed, DNS resolution, TLS, body read.
    Network,
    /// Request or navigation exceeded its fixed timeout.
    Timeout,
    /// Resource not found (404).
    NotFound,
    /// Server returned a 5xx status.
    ServerError,
    /// Any other non-200 status.
    HttpStatus,
    /// The body could not be used (not HTML, not UTF-8, empty).
    InvalidResponse,
    /// A required element was absent from the page.
    MissingStructure,
    /// The headless browser failed to launch, navigate or render.
    Browser,
    /// Invalid configuration, e.g. an unparseable source URL.
    Configuration,
}

impl ScrapeErrorCode {
    /// Returns `true` for failures caused by the transport rather than the page.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            Self::Network | Self::Timeout | Self::NotFound | Self::ServerError | Self::HttpStatus
        )
    }

    /// Returns a stable name for this error code.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Network => "network",
            Self::Timeout => "timeout",
            Self::NotFound => "not_found",
            Self::ServerError => "server_error",
            Self::HttpStatus => "http_status",
            Self::InvalidResponse => "invalid_response",
            Self::MissingStructure => "missing_structure",
            Self::Browser => "browser",
            Self::Configuration => "configuration",
        }
    }
}

impl fmt::Display for ScrapeErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An error that occurred while fetching or extracting one unit of work.
#[derive(Debug, Error)]
pub struct ScrapeError {
    code: ScrapeErrorCode,
    message: String,
    /// The URL being fetched or parsed, when known.
    url: Option<String>,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl ScrapeError {
    /// Creates a new error with the given code and message.
    pub fn new(code: ScrapeErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            url: None,
            source: None,
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(ScrapeErrorCode::Network, message)
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(ScrapeErrorCode::Timeout, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ScrapeErrorCode::NotFound, message)
    }

    pub fn server(message: impl Into<String>) -> Self {
        Self::new(ScrapeErrorCode::ServerError, message)
    }

    pub fn http_status(message: impl Into<String>) -> Self {
        Self::new(ScrapeErrorCode::HttpStatus, message)
    }

    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::new(ScrapeErrorCode::InvalidResponse, message)
    }

    pub fn missing(message: impl Into<String>) -> Self {
        Self::new(ScrapeErrorCode::MissingStructure, message)
    }

    pub fn browser(message: impl Into<String>) -> Self {
        Self::new(ScrapeErrorCode::Browser, message)
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(ScrapeErrorCode::Configuration, message)
    }

    /// Attaches the URL this error relates to.
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Sets the underlying cause.
    pub fn with_source<E>(mut self, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        self.source = Some(Box::new(source));
        self
    }

    pub fn code(&self) -> ScrapeErrorCode {
        self.code
    }

    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }
}

impl fmt::Display for ScrapeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)?;
        if let Some(ref url) = self.url {
            write!(f, " ({})", url)?;
        }
        Ok(())
    }
}

/// A specialized Result type for scrape operations.
pub type ScrapeResult<T> = Result<T, ScrapeError>;
