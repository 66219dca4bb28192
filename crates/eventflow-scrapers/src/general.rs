//! Paginated list-view calendars.
//!
//! A list page groups entries under date headers. Each accepted header
//! ("Monday, January 12, 2026") dates the entry list that follows it; the
//! entry itself carries only a time string. Pages are followed through their
//! "next" link up to a page cap.

use std::collections::HashSet;
use std::sync::{Arc, LazyLock};

use chrono::NaiveDate;
use eventflow_core::{
    DefaultDuration, Event, EventMap, EventSpan, IdAllocator, PLACEHOLDER_SUMMARY, normalize,
    normalize_on, parse_header_date,
};
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, info, warn};
use url::Url;

use crate::aggregate::{Extractor, SourceKind};
use crate::config::{SourceConfig, parse_source_url};
use crate::error::{ScrapeError, ScrapeResult};
use crate::fetch::{BoxFuture, PageFetcher};
use crate::html::{css, first, first_attr, first_text, resolve, text_of};

/// Location used when an entry lists none.
pub const UNKNOWN_LOCATION: &str = "TBA";

/// Tag used when an entry has no event type.
pub const DEFAULT_TAG: &str = "General";

/// Query parameter carrying the calendar's own event id.
const EVENT_ID_PARAM: &str = "eventId";

static LIST_CONTAINER: LazyLock<Selector> = LazyLock::new(|| css("div.ws-list"));
static HEADER_OR_LIST: LazyLock<Selector> =
    LazyLock::new(|| css("h3.list-date, ul.list-events"));
static LIST_ENTRY: LazyLock<Selector> = LazyLock::new(|| css("li.list-event"));
static ENTRY_LINK: LazyLock<Selector> = LazyLock::new(|| css("div.title a"));
static ENTRY_TIME: LazyLock<Selector> = LazyLock::new(|| css("div.date-time"));
static ENTRY_LOCATION: LazyLock<Selector> = LazyLock::new(|| css("div.location"));
static ENTRY_TYPE: LazyLock<Selector> = LazyLock::new(|| css("div.event-type"));
static NEXT_LINK: LazyLock<Selector> = LazyLock::new(|| css(r#"a.next, a[rel="next"]"#));

static DETAIL_SECTION: LazyLock<Selector> = LazyLock::new(|| css("section.detail-content"));
static DETAIL_TITLE: LazyLock<Selector> = LazyLock::new(|| css("h2"));
static DETAIL_DESCRIPTION: LazyLock<Selector> = LazyLock::new(|| css("dd.ws-description"));
static DETAIL_LABEL: LazyLock<Selector> = LazyLock::new(|| css("dt"));

/// One entry read from a list page.
#[derive(Debug, Clone, PartialEq)]
struct ListEntry {
    date: NaiveDate,
    title: String,
    link: Url,
    time: Option<String>,
    location: Option<String>,
    event_type: Option<String>,
}

impl ListEntry {
    fn into_event(self) -> Event {
        let time = self.time.as_deref().unwrap_or_default();
        let span = normalize_on(self.date, time, DefaultDuration::Standard).unwrap_or_else(|err| {
            debug!(link = %self.link, time = %time, error = %err, "entry time not normalized");
            EventSpan::Unknown
        });
        Event::new(&self.title, self.link.as_str(), span)
            .with_location(self.location.as_deref().unwrap_or(UNKNOWN_LOCATION))
            .with_tag(self.event_type.as_deref().unwrap_or(DEFAULT_TAG))
    }
}

#[derive(Debug, Default)]
struct ListPage {
    entries: Vec<ListEntry>,
    next: Option<Url>,
}

/// Reads the dated entries and the next-page link from a list page.
///
/// A page without a listing container is an error; the caller stops
/// following that source.
fn parse_list_page(html: &str, page_url: &Url) -> ScrapeResult<ListPage> {
    let doc = Html::parse_document(html);
    let container = first(doc.root_element(), &LIST_CONTAINER)
        .ok_or_else(|| ScrapeError::missing("no listing container").with_url(page_url.as_str()))?;

    let mut page = ListPage::default();
    let mut current: Option<NaiveDate> = None;
    for node in container.select(&HEADER_OR_LIST) {
        if node.value().name() == "h3" {
            let text = text_of(node);
            current = parse_header_date(&text);
            if current.is_none() {
                debug!(header = %text, "date header skipped");
            }
            continue;
        }
        // Only the list directly after an accepted header is dated by it.
        let Some(date) = current.take() else {
            continue;
        };
        page.entries
            .extend(node.select(&LIST_ENTRY).filter_map(|li| parse_entry(li, date, page_url)));
    }

    page.next = first_attr(doc.root_element(), &NEXT_LINK, "href")
        .and_then(|href| resolve(page_url, href));
    Ok(page)
}

fn parse_entry(li: ElementRef<'_>, date: NaiveDate, page_url: &Url) -> Option<ListEntry> {
    let anchor = first(li, &ENTRY_LINK)?;
    let Some(link) = anchor.value().attr("href").and_then(|href| resolve(page_url, href)) else {
        debug!(title = %text_of(anchor), "entry without link skipped");
        return None;
    };
    Some(ListEntry {
        date,
        title: text_of(anchor),
        link,
        time: first_text(li, &ENTRY_TIME),
        location: first_text(li, &ENTRY_LOCATION),
        event_type: first_text(li, &ENTRY_TYPE),
    })
}

/// The key entries are deduplicated on: the `eventId` query parameter, or
/// the whole URL when the link has none.
pub fn natural_key(link: &Url) -> String {
    link.query_pairs()
        .find(|(name, _)| name == EVENT_ID_PARAM)
        .map(|(_, value)| value.into_owned())
        .filter(|id| !id.is_empty())
        .unwrap_or_else(|| link.as_str().to_string())
}

/// A labelled field in an event detail page's definition list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetailField {
    Date,
    Location,
    EventType,
    Other,
}

impl DetailField {
    /// Classifies a `<dt>` label ("Date", "Event Type", ...).
    pub fn from_label(label: &str) -> Self {
        let key = label
            .split_whitespace()
            .collect::<Vec<_>>()
            .join("_")
            .to_ascii_lowercase();
        match key.trim_end_matches(':') {
            "date" => Self::Date,
            "location" => Self::Location,
            "event_type" => Self::EventType,
            _ => Self::Other,
        }
    }
}

#[derive(Debug, Default, PartialEq)]
struct Detail {
    title: Option<String>,
    description: Option<String>,
    fields: Vec<(DetailField, String)>,
}

fn parse_detail(html: &str) -> ScrapeResult<Detail> {
    let doc = Html::parse_document(html);
    let section = first(doc.root_element(), &DETAIL_SECTION)
        .ok_or_else(|| ScrapeError::missing("no detail section"))?;

    let fields = section
        .select(&DETAIL_LABEL)
        .filter_map(|dt| {
            let value = dt
                .next_siblings()
                .filter_map(ElementRef::wrap)
                .take_while(|el| el.value().name() != "dt")
                .find(|el| el.value().name() == "dd")?;
            let text = text_of(value);
            (!text.is_empty()).then(|| (DetailField::from_label(&text_of(dt)), text))
        })
        .collect();

    Ok(Detail {
        title: first_text(section, &DETAIL_TITLE),
        description: first_text(section, &DETAIL_DESCRIPTION),
        fields,
    })
}

impl Detail {
    /// Folds the detail page into a list-derived event.
    fn apply(self, mut event: Event) -> Event {
        if let Some(title) = self.title {
            if event.summary() == PLACEHOLDER_SUMMARY {
                event = event.with_summary(title);
            }
        }
        if let Some(description) = self.description {
            event = event.with_description(description);
        }
        for (field, value) in self.fields {
            match field {
                DetailField::Date => {
                    if !event.span().is_known() {
                        event = event.with_span(normalize(&value, None, DefaultDuration::Standard));
                    }
                }
                DetailField::Location => {
                    if event.location() == UNKNOWN_LOCATION {
                        event = event.with_location(value);
                    }
                }
                DetailField::EventType => event = event.with_tag(value),
                DetailField::Other => {}
            }
        }
        event
    }
}

/// Scrapes the configured list-view calendars.
pub struct GeneralExtractor {
    fetcher: Arc<dyn PageFetcher>,
    sources: Vec<String>,
    page_cap: usize,
    fetch_details: bool,
}

impl GeneralExtractor {
    pub fn new(fetcher: Arc<dyn PageFetcher>, config: &SourceConfig) -> Self {
        Self {
            fetcher,
            sources: config.general.clone(),
            page_cap: config.page_cap,
            fetch_details: config.fetch_details,
        }
    }

    /// Walks every source. Entries are deduplicated across all of them.
    pub async fn scrape(&self, ids: &mut IdAllocator) -> EventMap {
        let mut events = EventMap::new();
        let mut seen = HashSet::new();

        for source in &self.sources {
            let url = match parse_source_url(source) {
                Ok(url) => url,
                Err(e) => {
                    warn!(error = %e, "calendar source skipped");
                    continue;
                }
            };
            let before = events.len();
            let pages = self.walk(url, &mut seen, &mut events, ids).await;
            info!(
                source = %source,
                pages,
                events = events.len() - before,
                "calendar scraped"
            );
        }
        events
    }

    /// Follows one source's pages; returns the number of pages read.
    async fn walk(
        &self,
        first_page: Url,
        seen: &mut HashSet<String>,
        events: &mut EventMap,
        ids: &mut IdAllocator,
    ) -> usize {
        let mut visited = HashSet::new();
        let mut next = Some(first_page);
        let mut pages = 0;

        while let Some(url) = next.take() {
            if pages >= self.page_cap {
                debug!(url = %url, cap = self.page_cap, "page cap reached");
                break;
            }
            if !visited.insert(url.clone()) {
                debug!(url = %url, "next link revisits a page");
                break;
            }

            let page = match self.fetch_list(&url).await {
                Ok(page) => page,
                Err(e) => {
                    warn!(error = %e, "list page skipped");
                    break;
                }
            };
            pages += 1;

            for entry in page.entries {
                if !seen.insert(natural_key(&entry.link)) {
                    debug!(link = %entry.link, "duplicate event skipped");
                    continue;
                }
                let link = entry.link.clone();
                let mut event = entry.into_event();
                if self.fetch_details {
                    event = self.enrich(&link, event).await;
                }
                ids.assign(events, event);
            }
            next = page.next;
        }
        pages
    }

    async fn fetch_list(&self, url: &Url) -> ScrapeResult<ListPage> {
        let html = self.fetcher.fetch(url.as_str()).await?;
        parse_list_page(&html, url)
    }

    async fn enrich(&self, link: &Url, event: Event) -> Event {
        let detail = match self.fetcher.fetch(link.as_str()).await {
            Ok(html) => parse_detail(&html),
            Err(e) => Err(e),
        };
        match detail {
            Ok(detail) => detail.apply(event),
            Err(e) => {
                warn!(link = %link, error = %e, "detail page skipped");
                event
            }
        }
    }
}

impl Extractor for GeneralExtractor {
    fn source(&self) -> SourceKind {
        SourceKind::General
    }

    fn extract<'a>(&'a self, ids: &'a mut IdAllocator) -> BoxFuture<'a, EventMap> {
        Box::pin(self.scrape(ids))
    }
}
