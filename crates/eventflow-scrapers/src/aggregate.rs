//! Runs the extractors and merges their events.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use eventflow_core::{EventId, EventMap, IdAllocator};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::arena::ArenaExtractor;
use crate::athletics::AthleticsExtractor;
use crate::browser::BrowserLauncher;
use crate::config::{HttpSettings, SourceConfig};
use crate::error::{ScrapeError, ScrapeResult};
use crate::fetch::{BoxFuture, HttpFetcher, PageFetcher};
use crate::general::GeneralExtractor;

/// The kind of source an extractor reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Arena,
    Athletics,
    General,
}

impl SourceKind {
    /// Every source, in run order.
    pub const ALL: [SourceKind; 3] = [Self::Arena, Self::Athletics, Self::General];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Arena => "arena",
            Self::Athletics => "athletics",
            Self::General => "general",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SourceKind {
    type Err = ScrapeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ScrapeError::configuration(format!("unknown source {:?}", s)))
    }
}

/// One source-specific scraping strategy.
///
/// An extractor never fails as a whole: every unit of work it cannot
/// complete is logged and skipped, and whatever was collected is returned.
pub trait Extractor: Send + Sync {
    fn source(&self) -> SourceKind;

    /// Runs one pass, drawing ids from the run's allocator.
    fn extract<'a>(&'a self, ids: &'a mut IdAllocator) -> BoxFuture<'a, EventMap>;
}

/// What one extractor contributed to a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceSummary {
    pub source: SourceKind,
    /// Ids of the events it produced, ascending.
    pub ids: Vec<EventId>,
    pub elapsed: Duration,
}

impl SourceSummary {
    pub fn events(&self) -> usize {
        self.ids.len()
    }
}

/// The merged result of one run.
#[derive(Debug, Default)]
pub struct AggregateReport {
    pub events: EventMap,
    pub sources: Vec<SourceSummary>,
}

impl AggregateReport {
    /// The events one source produced.
    pub fn events_from(&self, source: SourceKind) -> EventMap {
        self.sources
            .iter()
            .filter(|summary| summary.source == source)
            .flat_map(|summary| &summary.ids)
            .filter_map(|id| self.events.get(id).map(|event| (*id, event.clone())))
            .collect()
    }

    /// Sources that produced no events.
    pub fn empty_sources(&self) -> Vec<SourceKind> {
        self.sources
            .iter()
            .filter(|summary| summary.ids.is_empty())
            .map(|summary| summary.source)
            .collect()
    }
}

/// Owns the run's id allocator and its extractors.
pub struct Aggregator {
    extractors: Vec<Box<dyn Extractor>>,
    ids: IdAllocator,
}

impl Aggregator {
    pub fn new() -> Self {
        Self {
            extractors: Vec::new(),
            ids: IdAllocator::new(),
        }
    }

    /// Appends an extractor. Extractors run in the order they were added.
    pub fn with_extractor(mut self, extractor: Box<dyn Extractor>) -> Self {
        self.extractors.push(extractor);
        self
    }

    /// Wires the production extractors for `only` (every source when empty),
    /// always in [`SourceKind::ALL`] order.
    pub fn from_config(
        sources: &SourceConfig,
        http: &HttpSettings,
        only: &[SourceKind],
    ) -> ScrapeResult<Self> {
        let fetcher: Arc<dyn PageFetcher> = Arc::new(HttpFetcher::new(http)?);

        let mut aggregator = Self::new();
        for kind in SourceKind::ALL {
            if !only.is_empty() && !only.contains(&kind) {
                continue;
            }
            sources.validate_source(kind)?;
            let extractor: Box<dyn Extractor> = match kind {
                SourceKind::Arena => Box::new(ArenaExtractor::new(browser_launcher(http), sources)),
                SourceKind::Athletics => {
                    Box::new(AthleticsExtractor::new(fetcher.clone(), sources))
                }
                SourceKind::General => Box::new(GeneralExtractor::new(fetcher.clone(), sources)),
            };
            aggregator = aggregator.with_extractor(extractor);
        }
        Ok(aggregator)
    }

    /// The sources this aggregator will run, in order.
    pub fn sources(&self) -> Vec<SourceKind> {
        self.extractors.iter().map(|e| e.source()).collect()
    }

    /// Resets the id allocator and runs every extractor in sequence.
    pub async fn run(&mut self) -> AggregateReport {
        self.ids.reset();
        let mut report = AggregateReport::default();

        for extractor in &self.extractors {
            let source = extractor.source();
            let started = Instant::now();
            let batch = extractor.extract(&mut self.ids).await;
            let elapsed = started.elapsed();

            let ids: Vec<EventId> = batch.keys().copied().collect();
            for (id, event) in batch {
                if let Some(previous) = report.events.insert(id, event) {
                    warn!(
                        id,
                        source = %source,
                        replaced = %previous.summary(),
                        "event id collision, keeping the later event"
                    );
                }
            }
            info!(
                source = %source,
                events = ids.len(),
                elapsed_ms = elapsed.as_millis() as u64,
                "source finished"
            );
            report.sources.push(SourceSummary {
                source,
                ids,
                elapsed,
            });
        }

        info!(events = report.events.len(), "aggregation finished");
        report
    }
}

impl Default for Aggregator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "chromium")]
fn browser_launcher(http: &HttpSettings) -> Arc<dyn BrowserLauncher> {
    Arc::new(crate::browser::ChromiumLauncher::new(http.clone()))
}

#[cfg(not(feature = "chromium"))]
fn browser_launcher(_http: &HttpSettings) -> Arc<dyn BrowserLauncher> {
    Arc::new(Unavailable)
}

/// Stands in for the browser when built without Chromium support.
#[cfg(not(feature = "chromium"))]
struct Unavailable;

#[cfg(not(feature = "chromium"))]
impl BrowserLauncher for Unavailable {
    fn launch(&self) -> BoxFuture<'_, ScrapeResult<Box<dyn crate::browser::BrowserSession>>> {
        Box::pin(async {
            Err(ScrapeError::browser(
                "built without the `chromium` feature",
            ))
        })
    }
}
