//! Source and transport configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::aggregate::SourceKind;
use crate::error::{ScrapeError, ScrapeResult};

/// Illinois WebTools list calendars scraped by the general extractor.
pub const DEFAULT_GENERAL_SOURCES: &[&str] = &[
    "https://calendars.illinois.edu/list/7",
    "https://calendars.illinois.edu/list/557",
    "https://calendars.illinois.edu/list/594",
    "https://calendars.illinois.edu/list/4756",
    "https://calendars.illinois.edu/list/596",
    "https://calendars.illinois.edu/list/62",
    "https://calendars.illinois.edu/list/597",
    "https://calendars.illinois.edu/list/637",
    "https://calendars.illinois.edu/list/4757",
    "https://calendars.illinois.edu/list/598",
];

/// The arena's event listing, rendered client-side.
pub const DEFAULT_ARENA_LISTING: &str = "https://www.statefarmcenter.com/events/all";

/// Sport schedules scraped for home games.
pub const DEFAULT_ATHLETICS_SCHEDULES: &[&str] = &[
    "https://fightingillini.com/sports/football/schedule",
    "https://fightingillini.com/sports/mens-basketball/schedule",
    "https://fightingillini.com/sports/womens-basketball/schedule",
    "https://fightingillini.com/sports/womens-volleyball/schedule",
];

/// The source URL lists for one run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// List-view calendars for the general extractor.
    pub general: Vec<String>,
    /// Maximum list pages followed per general source.
    pub page_cap: usize,
    /// Whether the general extractor fetches each event's detail page.
    pub fetch_details: bool,
    /// The arena listing page.
    pub arena: String,
    /// Sport schedule pages.
    pub athletics: Vec<String>,
}

impl SourceConfig {
    /// Default number of list pages followed per general source.
    pub const DEFAULT_PAGE_CAP: usize = 5;

    /// Checks every configured URL parses as an absolute http(s) URL.
    pub fn validate(&self) -> ScrapeResult<()> {
        SourceKind::ALL
            .into_iter()
            .try_for_each(|kind| self.validate_source(kind))
    }

    /// Checks only the settings `kind` reads.
    pub fn validate_source(&self, kind: SourceKind) -> ScrapeResult<()> {
        match kind {
            SourceKind::Arena => parse_source_url(&self.arena).map(drop),
            SourceKind::Athletics => self
                .athletics
                .iter()
                .try_for_each(|url| parse_source_url(url).map(drop)),
            SourceKind::General => {
                if self.page_cap == 0 {
                    return Err(ScrapeError::configuration("page_cap must be at least 1"));
                }
                self.general
                    .iter()
                    .try_for_each(|url| parse_source_url(url).map(drop))
            }
        }
    }
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            general: DEFAULT_GENERAL_SOURCES.iter().map(|s| s.to_string()).collect(),
            page_cap: Self::DEFAULT_PAGE_CAP,
            fetch_details: true,
            arena: DEFAULT_ARENA_LISTING.to_string(),
            athletics: DEFAULT_ATHLETICS_SCHEDULES
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

/// Parses a configured source URL, requiring an http or https scheme.
pub fn parse_source_url(url: &str) -> ScrapeResult<Url> {
    let parsed = Url::parse(url).map_err(|e| {
        ScrapeError::configuration(format!("invalid source URL: {}", e)).with_url(url)
    })?;
    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        other => Err(
            ScrapeError::configuration(format!("unsupported scheme {:?}", other)).with_url(url),
        ),
    }
}

/// Transport settings shared by the HTTP fetcher and the browser.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpSettings {
    /// User agent sent with every request and navigation.
    pub user_agent: String,
    /// Per-request and per-navigation timeout, in seconds.
    pub timeout_secs: u64,
}

impl HttpSettings {
    /// Default timeout in seconds.
    pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

    /// Default user agent. Several sources reject unknown clients.
    pub const DEFAULT_USER_AGENT: &'static str = concat!(
        "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 ",
        "(KHTML, like Gecko) Chrome/124.0 Safari/537.36",
    );

    /// The timeout as a [`Duration`].
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            user_agent: Self::DEFAULT_USER_AGENT.to_string(),
            timeout_secs: Self::DEFAULT_TIMEOUT_SECS,
        }
    }
}
