//! Home games from the athletics schedule pages.
//!
//! Schedule entries print "Month Day" without a year. A season spans the
//! new year, so the year is inferred from the current date: once the season
//! has turned over (August or later), games in January through July belong
//! to the next calendar year.

use std::sync::{Arc, LazyLock};

use chrono::{Datelike, NaiveDate, NaiveTime, Utc};
use eventflow_core::{
    DefaultDuration, Event, EventMap, EventSpan, HOME_ZONE, IdAllocator, localize, parse_clock,
    parse_month,
};
use regex::Regex;
use scraper::{Html, Selector};
use tracing::{debug, info, warn};

use crate::aggregate::{Extractor, SourceKind};
use crate::config::{SourceConfig, parse_source_url};
use crate::error::ScrapeResult;
use crate::fetch::{BoxFuture, PageFetcher};
use crate::html::{css, first, first_text, text_of};

/// First month of a new season.
pub const TURNOVER_MONTH: u32 = 8;

/// Games without a published time are placed at noon.
pub const MIDDAY_START_HOUR: u32 = 12;

pub const ATHLETICS_TAG: &str = "Athletics";

/// Location used when a game lists no venue.
pub const HOME_LOCATION: &str = "Champaign, IL";

const DEFAULT_SPORT: &str = "Sport";
const UNKNOWN_OPPONENT: &str = "TBA";

static SPORT_TITLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\d-]+ (.*) Schedule").expect("valid sport title regex"));
static MONTH_DAY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([A-Za-z]{3,9})\.?\s+(\d{1,2})").expect("valid month-day regex"));

static HOME_GAME: LazyLock<Selector> = LazyLock::new(|| css("li.sidearm-schedule-home-game"));
static SCHEDULE_TITLE: LazyLock<Selector> = LazyLock::new(|| css("div.sidearm-schedule-title h2"));
static OPPONENT: LazyLock<Selector> =
    LazyLock::new(|| css("div.sidearm-schedule-game-opponent-name a"));
static DATE_BLOCK: LazyLock<Selector> =
    LazyLock::new(|| css("div.sidearm-schedule-game-opponent-date"));
static LOCATION_BLOCK: LazyLock<Selector> =
    LazyLock::new(|| css("div.sidearm-schedule-game-location"));
static SPAN: LazyLock<Selector> = LazyLock::new(|| css("span"));

/// The calendar year a game in `event_month` falls in, seen from `today`.
pub fn season_year(today: NaiveDate, event_month: u32) -> i32 {
    if today.month() >= TURNOVER_MONTH && event_month < TURNOVER_MONTH {
        today.year() + 1
    } else {
        today.year()
    }
}

/// Extracts the sport name from a heading like "2025-26 Men's Basketball Schedule".
pub fn sport_name(heading: &str) -> String {
    SPORT_TITLE
        .captures(heading.trim())
        .map(|caps| caps[1].trim().to_string())
        .filter(|sport| !sport.is_empty())
        .unwrap_or_else(|| DEFAULT_SPORT.to_string())
}

#[derive(Debug, Default, PartialEq)]
struct Game {
    opponent: Option<String>,
    date: String,
    time: Option<String>,
    location: Option<String>,
}

#[derive(Debug, PartialEq)]
struct Schedule {
    sport: String,
    games: Vec<Game>,
}

fn parse_schedule(html: &str) -> Schedule {
    let doc = Html::parse_document(html);
    let root = doc.root_element();

    let sport = first_text(root, &SCHEDULE_TITLE)
        .map(|heading| sport_name(&heading))
        .unwrap_or_else(|| DEFAULT_SPORT.to_string());

    let games = doc
        .select(&HOME_GAME)
        .filter_map(|li| {
            let Some(date_block) = first(li, &DATE_BLOCK) else {
                debug!("home game without date block skipped");
                return None;
            };
            let mut date_spans = date_block.select(&SPAN).map(text_of);
            let date = date_spans.next().unwrap_or_default();
            let time = date_spans.next().filter(|t| !t.is_empty());

            let location = first(li, &LOCATION_BLOCK).and_then(|block| {
                let spans: Vec<String> = block
                    .select(&SPAN)
                    .map(text_of)
                    .filter(|s| !s.is_empty())
                    .collect();
                match spans.as_slice() {
                    [city, venue, ..] => Some(format!("{venue}, {city}")),
                    _ => None,
                }
            });

            Some(Game {
                opponent: first_text(li, &OPPONENT),
                date,
                time,
                location,
            })
        })
        .collect();

    Schedule { sport, games }
}

impl Game {
    fn span(&self, today: NaiveDate) -> EventSpan {
        let Some(day) = self.day(today) else {
            debug!(date = %self.date, "game date not parsed");
            return EventSpan::Unknown;
        };
        let time = self
            .time
            .as_deref()
            .and_then(parse_clock)
            .or_else(|| NaiveTime::from_hms_opt(MIDDAY_START_HOUR, 0, 0));
        let Some(time) = time else {
            return EventSpan::Unknown;
        };
        let start = match localize(day, time) {
            Ok(start) => start,
            Err(err) => {
                debug!(error = %err, "game time not normalized");
                return EventSpan::Unknown;
            }
        };
        EventSpan::starting_at(start, DefaultDuration::Venue).unwrap_or_else(|| {
            debug!(start = %start, "game ends out of range");
            EventSpan::Unknown
        })
    }

    fn day(&self, today: NaiveDate) -> Option<NaiveDate> {
        let caps = MONTH_DAY.captures(&self.date)?;
        let month = parse_month(&caps[1])?;
        let day = caps[2].parse().ok()?;
        NaiveDate::from_ymd_opt(season_year(today, month), month, day)
    }

    fn into_event(self, sport: &str, link: &str, today: NaiveDate) -> Event {
        let span = self.span(today);
        let opponent = self.opponent.as_deref().unwrap_or(UNKNOWN_OPPONENT);
        Event::new(format!("{sport} Game: Illinois VS. {opponent}"), link, span)
            .with_location(self.location.as_deref().unwrap_or(HOME_LOCATION))
            .with_tag(ATHLETICS_TAG)
    }
}

/// Scrapes home games from the configured schedule pages.
pub struct AthleticsExtractor {
    fetcher: Arc<dyn PageFetcher>,
    schedules: Vec<String>,
    today: Option<NaiveDate>,
}

impl AthleticsExtractor {
    pub fn new(fetcher: Arc<dyn PageFetcher>, config: &SourceConfig) -> Self {
        Self {
            fetcher,
            schedules: config.athletics.clone(),
            today: None,
        }
    }

    /// Fixes the date season years are inferred from.
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }

    fn today(&self) -> NaiveDate {
        self.today
            .unwrap_or_else(|| Utc::now().with_timezone(&HOME_ZONE).date_naive())
    }

    pub async fn scrape(&self, ids: &mut IdAllocator) -> EventMap {
        let today = self.today();
        let mut events = EventMap::new();

        for url in &self.schedules {
            let schedule = match self.fetch_schedule(url).await {
                Ok(schedule) => schedule,
                Err(e) => {
                    warn!(error = %e, "schedule skipped");
                    continue;
                }
            };
            let games = schedule.games.len();
            for game in schedule.games {
                ids.assign(&mut events, game.into_event(&schedule.sport, url, today));
            }
            info!(schedule = %url, sport = %schedule.sport, games, "schedule scraped");
        }
        events
    }

    async fn fetch_schedule(&self, url: &str) -> ScrapeResult<Schedule> {
        let url = parse_source_url(url)?;
        let html = self.fetcher.fetch(url.as_str()).await?;
        Ok(parse_schedule(&html))
    }
}

impl Extractor for AthleticsExtractor {
    fn source(&self) -> SourceKind {
        SourceKind::Athletics
    }

    fn extract<'a>(&'a self, ids: &'a mut IdAllocator) -> BoxFuture<'a, EventMap> {
        Box::pin(self.scrape(ids))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeFetcher;

    const FOOTBALL: &str = "https://athletics.example.com/sports/football/schedule";
    const VOLLEYBALL: &str = "https://athletics.example.com/sports/womens-volleyball/schedule";
    const STADIUM: &[&str] = &["Champaign, Ill.", "Memorial Stadium"];

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn game(opponent: Option<&str>, date: Option<(&str, &str)>, location: &[&str]) -> String {
        let opponent = opponent
            .map(|o| {
                format!(
                    r#"<div class="sidearm-schedule-game-opponent-name"><a href="/x">{o}</a></div>"#
                )
            })
            .unwrap_or_default();
        let date = date
            .map(|(d, t)| {
                format!(
                    r#"<div class="sidearm-schedule-game-opponent-date">
                         <span>{d}</span><span>{t}</span>
                       </div>"#
                )
            })
            .unwrap_or_default();
        let spans: String = location.iter().map(|s| format!("<span>{s}</span>")).collect();
        format!(
            r#"<li class="sidearm-schedule-game sidearm-schedule-home-game">
                 {opponent}{date}
                 <div class="sidearm-schedule-game-location">{spans}</div>
               </li>"#
        )
    }

    fn schedule(title: &str, games: &[String]) -> String {
        format!(
            r#"<html><body>
                 <div class="sidearm-schedule-title"><h2>{title}</h2></div>
                 <ul>{}
                   <li class="sidearm-schedule-game sidearm-schedule-away-game">
                     <div class="sidearm-schedule-game-opponent-name"><a>Away Team</a></div>
                   </li>
                 </ul>
               </body></html>"#,
            games.concat()
        )
    }

    mod rollover {
        use super::*;

        #[test]
        fn january_game_seen_in_the_fall_is_next_year() {
            assert_eq!(season_year(date(2025, 8, 1), 1), 2026);
            assert_eq!(season_year(date(2025, 11, 20), 3), 2026);
        }

        #[test]
        fn same_half_of_the_season_is_this_year() {
            assert_eq!(season_year(date(2025, 9, 1), 11), 2025);
            assert_eq!(season_year(date(2025, 8, 1), 8), 2025);
        }

        #[test]
        fn before_turnover_is_this_year() {
            assert_eq!(season_year(date(2026, 2, 1), 1), 2026);
            assert_eq!(season_year(date(2026, 7, 31), 12), 2026);
        }
    }

    mod parsing {
        use super::*;

        #[test]
        fn sport_names() {
            assert_eq!(sport_name("2025 Football Schedule"), "Football");
            assert_eq!(sport_name("2025-26 Men's Basketball Schedule"), "Men's Basketball");
            assert_eq!(sport_name("Football Schedule"), "Sport");
            assert_eq!(sport_name(""), "Sport");
        }

        #[test]
        fn only_home_games_are_read() {
            let html = schedule(
                "2025 Football Schedule",
                &[
                    game(Some("Purdue"), Some(("Nov 22 (Sat)", "2:30 PM")), STADIUM),
                    game(None, Some(("Dec 6", "TBA")), &[]),
                ],
            );
            let parsed = parse_schedule(&html);
            assert_eq!(parsed.sport, "Football");
            assert_eq!(
                parsed.games,
                [
                    Game {
                        opponent: Some("Purdue".into()),
                        date: "Nov 22 (Sat)".into(),
                        time: Some("2:30 PM".into()),
                        location: Some("Memorial Stadium, Champaign, Ill.".into()),
                    },
                    Game {
                        opponent: None,
                        date: "Dec 6".into(),
                        time: Some("TBA".into()),
                        location: None,
                    },
                ]
            );
        }

        #[test]
        fn location_needs_both_spans() {
            let html = schedule(
                "2025 Football Schedule",
                &[game(Some("Purdue"), Some(("Nov 22", "2:30 PM")), &["Memorial Stadium"])],
            );
            let parsed = parse_schedule(&html);
            let game = parsed.games.into_iter().next().unwrap();
            assert_eq!(game.location, None);

            let event = game.into_event(&parsed.sport, FOOTBALL, date(2025, 9, 1));
            assert_eq!(event.location(), HOME_LOCATION);
        }

        #[test]
        fn game_without_date_block_is_skipped() {
            let html = schedule("2025 Football Schedule", &[game(Some("Purdue"), None, &[])]);
            assert!(parse_schedule(&html).games.is_empty());
        }
    }

    mod events {
        use super::*;

        fn purdue() -> Game {
            Game {
                opponent: Some("Purdue".into()),
                date: "Jan 17".into(),
                time: Some("7 pm".into()),
                location: None,
            }
        }

        #[test]
        fn summary_location_and_span() {
            let event = purdue().into_event("Men's Basketball", VOLLEYBALL, date(2025, 10, 1));
            assert_eq!(event.summary(), "Men's Basketball Game: Illinois VS. Purdue");
            assert_eq!(event.location(), HOME_LOCATION);
            assert_eq!(event.tag(), ATHLETICS_TAG);
            assert_eq!(event.link(), VOLLEYBALL);
            assert_eq!(event.description(), "");
            assert_eq!(event.span().start_iso(), "2026-01-17T19:00:00-06:00");
            assert_eq!(event.span().end_iso(), "2026-01-17T22:00:00-06:00");
        }

        #[test]
        fn missing_time_starts_at_midday() {
            let game = Game { time: Some("TBA".into()), ..purdue() };
            let span = game.span(date(2026, 1, 2));
            assert_eq!(span.start_iso(), "2026-01-17T12:00:00-06:00");
            assert_eq!(span.end_iso(), "2026-01-17T15:00:00-06:00");
        }

        #[test]
        fn missing_opponent_and_unparsed_date() {
            let game = Game {
                opponent: None,
                date: "TBD".into(),
                ..purdue()
            };
            let event = game.into_event("Football", FOOTBALL, date(2025, 9, 1));
            assert_eq!(event.summary(), "Football Game: Illinois VS. TBA");
            assert_eq!(event.span(), &EventSpan::Unknown);
        }
    }

    mod extraction {
        use super::*;

        #[tokio::test]
        async fn failing_schedule_does_not_stop_the_others() {
            let football = schedule(
                "2025 Football Schedule",
                &[game(Some("Purdue"), Some(("Nov 22", "2:30 PM")), STADIUM)],
            );
            let fetcher = FakeFetcher::new().page(FOOTBALL, football);
            let config = SourceConfig {
                athletics: vec![VOLLEYBALL.to_string(), FOOTBALL.to_string()],
                ..Default::default()
            };
            let extractor =
                AthleticsExtractor::new(Arc::new(fetcher), &config).with_today(date(2025, 9, 1));

            let events = extractor.scrape(&mut IdAllocator::new()).await;
            assert_eq!(events.len(), 1);
            let event = &events[&0];
            assert_eq!(event.summary(), "Football Game: Illinois VS. Purdue");
            assert_eq!(event.location(), "Memorial Stadium, Champaign, Ill.");
            assert_eq!(event.link(), FOOTBALL);
            assert_eq!(event.span().start_iso(), "2025-11-22T14:30:00-06:00");
        }
    }
}
