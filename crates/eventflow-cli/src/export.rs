//! Output shapes for a run's events.
//!
//! `raw` is the id-keyed record mapping. `calendar-import` re-splits each
//! record into the date and time strings a calendar-creation script expects.

use std::collections::BTreeMap;

use chrono::NaiveTime;
use eventflow_core::{DefaultDuration, Event, EventId, EventMap, EventSpan, localize};
use serde::Serialize;

use crate::cli::ExportFormat;
use crate::error::CliResult;

/// Date format of calendar-import records ("Jan 12, 2026").
pub const IMPORT_DATE_FORMAT: &str = "%b %d, %Y";

/// Time format of calendar-import records ("06:30 PM").
pub const IMPORT_TIME_FORMAT: &str = "%I:%M %p";

/// All-day events are imported as a short entry at this hour.
const ALL_DAY_IMPORT_HOUR: u32 = 9;

/// One event in calendar-import shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CalendarImportEvent {
    pub title: String,
    pub description: String,
    pub location: String,
    pub tag: String,
    pub link: String,
    pub start_date: String,
    pub start_time: String,
    pub end_date: String,
    pub end_time: String,
}

impl CalendarImportEvent {
    /// Converts an event, or `None` when its time is unknown.
    pub fn from_event(event: &Event) -> Option<Self> {
        let span = import_span(event.span())?;
        let (start, end) = (span.start()?, span.end()?);
        Some(Self {
            title: event.summary().to_string(),
            description: event.description().to_string(),
            location: event.location().to_string(),
            tag: event.tag().to_string(),
            link: event.link().to_string(),
            start_date: start.format(IMPORT_DATE_FORMAT).to_string(),
            start_time: start.format(IMPORT_TIME_FORMAT).to_string(),
            end_date: end.format(IMPORT_DATE_FORMAT).to_string(),
            end_time: end.format(IMPORT_TIME_FORMAT).to_string(),
        })
    }
}

/// Calendar imports cannot express all-day entries, so those become a
/// short morning entry on the same day.
fn import_span(span: &EventSpan) -> Option<EventSpan> {
    if !span.is_all_day() {
        return span.is_known().then(|| span.clone());
    }
    let day = span.start()?.date_naive();
    let start = localize(day, NaiveTime::from_hms_opt(ALL_DAY_IMPORT_HOUR, 0, 0)?).ok()?;
    EventSpan::starting_at(start, DefaultDuration::Short)
}

/// Converts every event with a known time.
pub fn calendar_import(events: &EventMap) -> BTreeMap<EventId, CalendarImportEvent> {
    events
        .iter()
        .filter_map(|(id, event)| CalendarImportEvent::from_event(event).map(|e| (*id, e)))
        .collect()
}

/// Serializes `events` in the requested shape.
pub fn render(events: &EventMap, format: ExportFormat, pretty: bool) -> CliResult<String> {
    let json = match (format, pretty) {
        (ExportFormat::Raw, true) => serde_json::to_string_pretty(events)?,
        (ExportFormat::Raw, false) => serde_json::to_string(events)?,
        (ExportFormat::CalendarImport, true) => {
            serde_json::to_string_pretty(&calendar_import(events))?
        }
        (ExportFormat::CalendarImport, false) => serde_json::to_string(&calendar_import(events))?,
    };
    Ok(json)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use eventflow_core::normalize;

    fn event(span: EventSpan) -> Event {
        Event::new("Jazz Night", "https://example.com/e/1", span)
            .with_location("Krannert Center")
            .with_tag("Performance")
    }

    #[test]
    fn timed_event() {
        let span = normalize("January 12, 2026", Some("6:30 - 8:00 pm"), DefaultDuration::Standard);
        let import = CalendarImportEvent::from_event(&event(span)).unwrap();
        assert_eq!(import.title, "Jazz Night");
        assert_eq!(import.start_date, "Jan 12, 2026");
        assert_eq!(import.start_time, "06:30 PM");
        assert_eq!(import.end_date, "Jan 12, 2026");
        assert_eq!(import.end_time, "08:00 PM");
    }

    #[test]
    fn all_day_event_becomes_a_short_morning_entry() {
        let day = NaiveDate::from_ymd_opt(2026, 1, 13).unwrap();
        let all_day = event(EventSpan::all_day(day).unwrap());
        let import = CalendarImportEvent::from_event(&all_day).unwrap();
        assert_eq!(import.start_time, "09:00 AM");
        assert_eq!(import.end_time, "10:00 AM");
        assert_eq!(import.end_date, "Jan 13, 2026");
    }

    #[test]
    fn unknown_time_is_skipped() {
        let mut events = EventMap::new();
        events.insert(0, event(EventSpan::Unknown));
        events.insert(
            1,
            event(normalize("March 3, 2026", Some("7:00 pm"), DefaultDuration::Standard)),
        );
        let import = calendar_import(&events);
        assert_eq!(import.keys().copied().collect::<Vec<_>>(), [1]);
    }

    #[test]
    fn raw_render_keys_are_ids() {
        let mut events = EventMap::new();
        events.insert(3, event(EventSpan::Unknown));
        let json = render(&events, ExportFormat::Raw, false).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["3"]["summary"], "Jazz Night");
        assert_eq!(value["3"]["start"], "");
        assert_eq!(value["3"]["end"], "");
    }
}
