//! The arena's client-rendered event listing.
//!
//! Both the listing and every detail page are rendered in one browser
//! session. The session is closed once the pass is over, however it ended.

use std::collections::HashSet;
use std::sync::{Arc, LazyLock};

use chrono::{NaiveDate, NaiveTime};
use eventflow_core::{
    DefaultDuration, Event, EventMap, EventSpan, IdAllocator, localize, parse_clock, parse_month,
};
use scraper::{Html, Selector};
use tracing::{debug, info, warn};
use url::Url;

use crate::aggregate::{Extractor, SourceKind};
use crate::browser::{BrowserLauncher, BrowserSession};
use crate::config::{SourceConfig, parse_source_url};
use crate::fetch::BoxFuture;
use crate::html::{css, first, first_text, resolve, text_of};

/// Every arena event takes place at the same address.
pub const VENUE_LOCATION: &str = "State Farm Center 1800 S 1st St, Champaign, IL 61820";

pub const ARENA_TAG: &str = "Entertainment";

/// Shows without a published start time are assumed to start at 7 pm.
pub const EVENING_START_HOUR: u32 = 19;

static DETAIL_LINK: LazyLock<Selector> = LazyLock::new(|| css("a.more.buttons-hide"));
static TITLE: LazyLock<Selector> = LazyLock::new(|| css("h1.title"));
static DESCRIPTION_PARAGRAPH: LazyLock<Selector> =
    LazyLock::new(|| css("div.description_inner p"));
static SIDEBAR: LazyLock<Selector> = LazyLock::new(|| css("ul.eventDetailList"));
static MONTH: LazyLock<Selector> = LazyLock::new(|| css("span.m-date__month"));
static DAY: LazyLock<Selector> = LazyLock::new(|| css("span.m-date__day"));
static YEAR: LazyLock<Selector> = LazyLock::new(|| css("span.m-date__year"));
static STARTS: LazyLock<Selector> = LazyLock::new(|| css("li.sidebar_event_starts span"));

/// Collects the detail links of the listing, in page order.
fn parse_listing(html: &str, listing: &Url) -> Vec<Url> {
    let doc = Html::parse_document(html);
    doc.select(&DETAIL_LINK)
        .filter_map(|a| a.value().attr("href"))
        .filter_map(|href| resolve(listing, href))
        .collect()
}

#[derive(Debug, Default, PartialEq)]
struct ShowPage {
    title: Option<String>,
    description: String,
    date: Option<NaiveDate>,
    starts: Option<String>,
}

fn parse_show(html: &str) -> ShowPage {
    let doc = Html::parse_document(html);
    let root = doc.root_element();

    let description = doc
        .select(&DESCRIPTION_PARAGRAPH)
        .map(text_of)
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join(" ");

    let sidebar = first(root, &SIDEBAR);
    let date = sidebar.and_then(|sidebar| {
        let month = parse_month(&first_text(sidebar, &MONTH)?)?;
        let day = digits(&first_text(sidebar, &DAY)?)?;
        let year = digits(&first_text(sidebar, &YEAR)?)?;
        NaiveDate::from_ymd_opt(i32::try_from(year).ok()?, month, day)
    });

    ShowPage {
        title: first_text(root, &TITLE),
        description,
        date,
        starts: sidebar.and_then(|sidebar| first_text(sidebar, &STARTS)),
    }
}

/// Reads the digits of a field such as "12th" or "'26 ".
fn digits(text: &str) -> Option<u32> {
    let digits: String = text.chars().filter(char::is_ascii_digit).collect();
    digits.parse().ok()
}

impl ShowPage {
    fn span(&self) -> EventSpan {
        let Some(date) = self.date else {
            return EventSpan::Unknown;
        };
        let time = self
            .starts
            .as_deref()
            .and_then(parse_clock)
            .or_else(|| NaiveTime::from_hms_opt(EVENING_START_HOUR, 0, 0));
        let Some(time) = time else {
            return EventSpan::Unknown;
        };
        let start = match localize(date, time) {
            Ok(start) => start,
            Err(err) => {
                debug!(error = %err, "show time not normalized");
                return EventSpan::Unknown;
            }
        };
        EventSpan::starting_at(start, DefaultDuration::Venue).unwrap_or_else(|| {
            debug!(start = %start, "show ends out of range");
            EventSpan::Unknown
        })
    }

    fn into_event(self, link: &Url) -> Event {
        let span = self.span();
        Event::new(self.title.unwrap_or_default(), link.as_str(), span)
            .with_description(self.description)
            .with_location(VENUE_LOCATION)
            .with_tag(ARENA_TAG)
    }
}

/// Scrapes the arena listing through a headless browser.
pub struct ArenaExtractor {
    launcher: Arc<dyn BrowserLauncher>,
    listing: String,
}

impl ArenaExtractor {
    pub fn new(launcher: Arc<dyn BrowserLauncher>, config: &SourceConfig) -> Self {
        Self {
            launcher,
            listing: config.arena.clone(),
        }
    }

    pub async fn scrape(&self, ids: &mut IdAllocator) -> EventMap {
        let mut events = EventMap::new();
        let listing = match parse_source_url(&self.listing) {
            Ok(url) => url,
            Err(e) => {
                warn!(error = %e, "arena listing skipped");
                return events;
            }
        };

        let mut session = match self.launcher.launch().await {
            Ok(session) => session,
            Err(e) => {
                warn!(error = %e, "browser unavailable, arena skipped");
                return events;
            }
        };

        self.render_all(session.as_mut(), &listing, &mut events, ids).await;

        if let Err(e) = session.close().await {
            warn!(error = %e, "browser did not close cleanly");
        }
        info!(listing = %listing, events = events.len(), "arena scraped");
        events
    }

    async fn render_all(
        &self,
        session: &mut dyn BrowserSession,
        listing: &Url,
        events: &mut EventMap,
        ids: &mut IdAllocator,
    ) {
        let links = match session.render(listing.as_str()).await {
            Ok(html) => parse_listing(&html, listing),
            Err(e) => {
                warn!(error = %e, "arena listing not rendered");
                return;
            }
        };
        debug!(links = links.len(), "arena listing rendered");

        let mut seen = HashSet::new();
        for link in links {
            if !seen.insert(link.clone()) {
                continue;
            }
            match session.render(link.as_str()).await {
                Ok(html) => {
                    ids.assign(events, parse_show(&html).into_event(&link));
                }
                Err(e) => warn!(error = %e, "show page skipped"),
            }
        }
    }
}

impl Extractor for ArenaExtractor {
    fn source(&self) -> SourceKind {
        SourceKind::Arena
    }

    fn extract<'a>(&'a self, ids: &'a mut IdAllocator) -> BoxFuture<'a, EventMap> {
        Box::pin(self.scrape(ids))
    }
}
