//! Fetchers, per-source extractors and the run aggregator.
//!
//! - [`PageFetcher`] / [`HttpFetcher`]: static pages over HTTP
//! - [`BrowserLauncher`] / [`BrowserSession`]: client-rendered pages
//! - [`GeneralExtractor`], [`ArenaExtractor`], [`AthleticsExtractor`]: one
//!   strategy per source shape
//! - [`Aggregator`]: runs the extractors in order and merges their events
//!
//! # Architecture
//!
//! ```text
//!   list calendars       arena listing        schedule pages
//!         │                    │                     │
//!         ▼                    ▼                     ▼
//!   ┌─────────────┐    ┌───────────────┐    ┌─────────────────┐
//!   │ HttpFetcher │    │ BrowserSession│    │   HttpFetcher   │
//!   └──────┬──────┘    └───────┬───────┘    └────────┬────────┘
//!          ▼                   ▼                     ▼
//!   GeneralExtractor     ArenaExtractor      AthleticsExtractor
//!          │                   │                     │
//!          └───────────┬───────┴─────────────────────┘
//!                      ▼   shared IdAllocator
//!               ┌────────────┐
//!               │ Aggregator │ ──▶ EventMap
//!               └────────────┘
//! ```
//!
//! No failure inside an extractor escapes it: pages, entries and browser
//! navigations that fail are logged and skipped.
//!
//! # Example
//!
//! ```ignore
//! use eventflow_scrapers::{Aggregator, HttpSettings, SourceConfig};
//!
//! let sources = SourceConfig::default();
//! let mut aggregator = Aggregator::from_config(&sources, &HttpSettings::default(), &[])?;
//! let report = aggregator.run().await;
//! println!("{} events", report.events.len());
//! ```

pub mod aggregate;
pub mod arena;
pub mod athletics;
pub mod browser;
pub mod config;
pub mod error;
pub mod fetch;
pub mod general;
mod html;
#[cfg(test)]
mod testing;

pub use aggregate::{AggregateReport, Aggregator, Extractor, SourceKind, SourceSummary};
pub use arena::ArenaExtractor;
pub use athletics::AthleticsExtractor;
#[cfg(feature = "chromium")]
pub use browser::{ChromiumLauncher, ChromiumSession};
pub use browser::{BrowserLauncher, BrowserSession};
pub use config::{HttpSettings, SourceConfig, parse_source_url};
pub use error::{ScrapeError, ScrapeErrorCode, ScrapeResult};
pub use fetch::{BoxFuture, HttpFetcher, PageFetcher};
pub use general::{DetailField, GeneralExtractor, natural_key};
