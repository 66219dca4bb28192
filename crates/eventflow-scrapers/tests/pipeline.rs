//! End-to-end runs of all three extractors against canned sites.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use chrono::NaiveDate;
use eventflow_core::EventMap;
use eventflow_scrapers::{
    Aggregator, ArenaExtractor, AthleticsExtractor, BoxFuture, BrowserLauncher, BrowserSession,
    GeneralExtractor, PageFetcher, ScrapeError, ScrapeResult, SourceConfig, SourceKind,
};

const CALENDAR_A: &str = "https://calendars.example.edu/list/7";
const CALENDAR_B: &str = "https://calendars.example.edu/list/557";
const CALENDAR_DOWN: &str = "https://calendars.example.edu/list/404";
const ARENA: &str = "https://arena.example.com/events/all";
const FOOTBALL: &str = "https://athletics.example.com/sports/football/schedule";

struct Site(HashMap<&'static str, String>);

impl Site {
    fn get(&self, url: &str) -> ScrapeResult<String> {
        self.0
            .get(url)
            .cloned()
            .ok_or_else(|| ScrapeError::not_found("page not found").with_url(url))
    }
}

impl PageFetcher for Site {
    fn fetch<'a>(&'a self, url: &'a str) -> BoxFuture<'a, ScrapeResult<String>> {
        Box::pin(async move { self.get(url) })
    }
}

struct Browser {
    site: Arc<Site>,
    closed: Arc<AtomicUsize>,
}

struct Tab {
    site: Arc<Site>,
    closed: Arc<AtomicUsize>,
}

impl BrowserLauncher for Browser {
    fn launch(&self) -> BoxFuture<'_, ScrapeResult<Box<dyn BrowserSession>>> {
        let tab = Tab {
            site: self.site.clone(),
            closed: self.closed.clone(),
        };
        Box::pin(async move { Ok(Box::new(tab) as Box<dyn BrowserSession>) })
    }
}

impl BrowserSession for Tab {
    fn render<'a>(&'a mut self, url: &'a str) -> BoxFuture<'a, ScrapeResult<String>> {
        Box::pin(async move { self.site.get(url) })
    }

    fn close(self: Box<Self>) -> BoxFuture<'static, ScrapeResult<()>> {
        Box::pin(async move {
            self.closed.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
    }
}

fn calendar_page(header: &str, entries: &[(u32, &str, &str)], next: Option<&str>) -> String {
    let items: String = entries
        .iter()
        .map(|(id, title, time)| {
            format!(
                r#"<li class="list-event">
                     <div class="title"><a href="/detail/7?eventId={id}">{title}</a></div>
                     <div class="date-time">{time}</div>
                     <div class="location">Foellinger Auditorium</div>
                   </li>"#
            )
        })
        .collect();
    let next = next
        .map(|href| format!(r#"<a class="next" href="{href}">Next</a>"#))
        .unwrap_or_default();
    format!(
        r#"<html><body><div class="ws-list"><h3 class="list-date">{header}</h3>
           <ul class="list-events">{items}</ul></div>{next}</body></html>"#
    )
}

fn site() -> Site {
    let mut pages = HashMap::new();
    pages.insert(
        CALENDAR_A,
        calendar_page(
            "Monday, January 12, 2026",
            &[(1, "Jazz Night", "6:30 - 8:00 pm"), (2, "Lecture", "2:00 pm")],
            Some("/list/7?page=2"),
        ),
    );
    pages.insert(
        "https://calendars.example.edu/list/7?page=2",
        calendar_page("Tuesday, January 13, 2026", &[(3, "Film", "All Day")], None),
    );
    // Cross-listed: event 2 appears again on another calendar.
    pages.insert(
        CALENDAR_B,
        calendar_page(
            "Monday, January 12, 2026",
            &[(2, "Lecture", "2:00 pm"), (4, "Workshop", "10:00 am")],
            None,
        ),
    );
    pages.insert(
        ARENA,
        r#"<a class="more buttons-hide" href="/e/comedy">More</a>
           <a class="more buttons-hide" href="/e/comedy">More</a>"#
            .to_string(),
    );
    pages.insert(
        "https://arena.example.com/e/comedy",
        r#"<h1 class="title">Comedy Night</h1>
           <ul class="eventDetailList"><li><span class="m-date__month">Feb</span>
           <span class="m-date__day">20</span><span class="m-date__year">2026</span></li></ul>"#
            .to_string(),
    );
    pages.insert(
        FOOTBALL,
        r#"<div class="sidearm-schedule-title"><h2>2025 Football Schedule</h2></div>
           <li class="sidearm-schedule-home-game">
             <div class="sidearm-schedule-game-opponent-name"><a>Purdue</a></div>
             <div class="sidearm-schedule-game-opponent-date">
               <span>Jan 2</span><span>11 am</span>
             </div>
           </li>"#
            .to_string(),
    );
    Site(pages)
}

fn config() -> SourceConfig {
    SourceConfig {
        general: vec![
            CALENDAR_A.to_string(),
            CALENDAR_DOWN.to_string(),
            CALENDAR_B.to_string(),
        ],
        fetch_details: false,
        arena: ARENA.to_string(),
        athletics: vec![FOOTBALL.to_string()],
        ..Default::default()
    }
}

fn summaries(events: &EventMap) -> Vec<(u64, &str)> {
    events.iter().map(|(id, e)| (*id, e.summary())).collect()
}

#[tokio::test]
async fn full_run_merges_sources_in_order() {
    let site = Arc::new(site());
    let closed = Arc::new(AtomicUsize::new(0));
    let config = config();

    let fetcher: Arc<dyn PageFetcher> = site.clone();
    let launcher = Arc::new(Browser {
        site: site.clone(),
        closed: closed.clone(),
    });
    let mut aggregator = Aggregator::new()
        .with_extractor(Box::new(ArenaExtractor::new(launcher, &config)))
        .with_extractor(Box::new(
            AthleticsExtractor::new(fetcher.clone(), &config)
                .with_today(NaiveDate::from_ymd_opt(2025, 9, 1).unwrap()),
        ))
        .with_extractor(Box::new(GeneralExtractor::new(fetcher, &config)));

    let report = aggregator.run().await;

    assert_eq!(
        summaries(&report.events),
        [
            (0, "Comedy Night"),
            (1, "Football Game: Illinois VS. Purdue"),
            (2, "Jazz Night"),
            (3, "Lecture"),
            (4, "Film"),
            (5, "Workshop"),
        ]
    );
    assert_eq!(closed.load(Ordering::SeqCst), 1);

    let arena = &report.events[&0];
    assert_eq!(arena.span().start_iso(), "2026-02-20T19:00:00-06:00");
    assert_eq!(arena.span().end_iso(), "2026-02-20T22:00:00-06:00");

    let game = &report.events[&1];
    assert_eq!(game.span().start_iso(), "2026-01-02T11:00:00-06:00");
    assert_eq!(game.location(), "Champaign, IL");

    let film = &report.events[&4];
    assert_eq!(film.span().start_iso(), "2026-01-13T00:00:00-06:00");
    assert_eq!(film.span().end_iso(), "2026-01-13T23:59:59-06:00");

    let per_source: Vec<_> = report
        .sources
        .iter()
        .map(|s| (s.source, s.events()))
        .collect();
    assert_eq!(
        per_source,
        [
            (SourceKind::Arena, 1),
            (SourceKind::Athletics, 1),
            (SourceKind::General, 4)
        ]
    );
    assert!(report.empty_sources().is_empty());
}

#[tokio::test]
async fn wire_format_of_a_run() {
    let site: Arc<dyn PageFetcher> = Arc::new(site());
    let config = SourceConfig {
        general: vec![CALENDAR_B.to_string()],
        ..config()
    };
    let mut aggregator =
        Aggregator::new().with_extractor(Box::new(GeneralExtractor::new(site, &config)));

    let report = aggregator.run().await;
    let json = serde_json::to_value(&report.events).unwrap();

    assert_eq!(
        json["0"],
        serde_json::json!({
            "summary": "Lecture",
            "description": "",
            "location": "Foellinger Auditorium",
            "tag": "General",
            "link": "https://calendars.example.edu/detail/7?eventId=2",
            "start": "2026-01-12T14:00:00-06:00",
            "end": "2026-01-12T16:00:00-06:00",
        })
    );
    assert_eq!(json["1"]["start"], "2026-01-12T10:00:00-06:00");
}

#[tokio::test]
async fn source_that_is_down_contributes_nothing() {
    let site: Arc<dyn PageFetcher> = Arc::new(site());
    let config = SourceConfig {
        general: vec![CALENDAR_DOWN.to_string()],
        athletics: vec!["https://athletics.example.com/sports/missing/schedule".to_string()],
        ..config()
    };
    let mut aggregator = Aggregator::new()
        .with_extractor(Box::new(AthleticsExtractor::new(site.clone(), &config)))
        .with_extractor(Box::new(GeneralExtractor::new(site, &config)));

    let report = aggregator.run().await;
    assert!(report.events.is_empty());
    assert_eq!(
        report.empty_sources(),
        [SourceKind::Athletics, SourceKind::General]
    );
}
