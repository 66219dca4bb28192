//! Date/time normalization for scraped event text.
//!
//! Sources publish dates and times as loose prose ("Monday, January 12, 2026",
//! "6:30 - 8:00 am", "All Day"). This module turns that text into an
//! [`EventSpan`]: either a start/end pair of instants in the [`HOME_ZONE`]
//! civil timezone, or [`EventSpan::Unknown`] when nothing usable can be
//! recovered.
//!
//! The entry point is [`normalize`]. It never fails and never panics; the
//! fallible core is exposed as [`try_normalize`] for callers that want the
//! reason a string was rejected.

use std::fmt;
use std::sync::LazyLock;

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime, TimeZone};
use chrono_tz::Tz;
use regex::Regex;
use thiserror::Error;
use tracing::debug;

/// The civil timezone every instant is expressed in.
pub const HOME_ZONE: Tz = chrono_tz::America::Chicago;

/// Whole-string date formats, tried in order. The first that parses wins.
const DATE_FORMATS: &[&str] = &[
    "%A, %B %d, %Y",
    "%A %B %d, %Y",
    "%B %d, %Y",
    "%B %d %Y",
    "%Y-%m-%d",
];

/// Date formats that carry a weekday. Date headers on list pages must match one.
const HEADER_FORMATS: &[&str] = &["%A, %B %d, %Y", "%A %B %d, %Y"];

const MONTHS: [&str; 12] = [
    "january",
    "february",
    "march",
    "april",
    "may",
    "june",
    "july",
    "august",
    "september",
    "october",
    "november",
    "december",
];

static TIME_RANGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"(?i)(\d{1,2}):(\d{2})\s*(am|pm)?",
        r"\s*[-\u{2013}\u{2014}]\s*",
        r"(\d{1,2}):(\d{2})\s*(am|pm)",
    ))
    .expect("valid time range regex")
});

static SINGLE_TIME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(\d{1,2}):(\d{2})\s*(am|pm)").expect("valid single time regex")
});

static CLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(\d{1,2})(?::(\d{2}))?\s*(am|pm)").expect("valid clock regex")
});

static NOON: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bnoon\b").expect("valid noon regex"));

static EMBEDDED_DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"([A-Za-z]{3,9})\.?\s+(\d{1,2}),?\s+(\d{4})").expect("valid embedded date regex")
});

/// Default event length used when a source publishes only a start time.
///
/// Which default applies is a per-caller decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefaultDuration {
    /// Two hours. Used for calendar entries that list a single start time.
    Standard,
    /// One hour. Used for short entries such as calendar-import fallbacks.
    Short,
    /// Three hours. Used for games and shows, which never publish an end time.
    Venue,
}

impl DefaultDuration {
    /// Returns the length of an event with this default.
    pub fn duration(self) -> Duration {
        match self {
            Self::Standard => Duration::hours(2),
            Self::Short => Duration::hours(1),
            Self::Venue => Duration::hours(3),
        }
    }
}

/// Why a piece of date/time text could not be normalized.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NormalizeError {
    /// No accepted date format matched.
    #[error("unparseable date: {0:?}")]
    UnparseableDate(String),

    /// The clock fields were out of range (e.g. "13:00 pm", "9:75 am").
    #[error("invalid clock time {hour}:{minute:02}")]
    InvalidClock { hour: u32, minute: u32 },

    /// The local time does not exist in the civil zone (DST gap).
    #[error("local time {0} does not exist in the civil zone")]
    NonexistentLocalTime(NaiveDateTime),

    /// The end of a range could not be placed at or after its start.
    #[error("range ends before it starts")]
    EndBeforeStart,

    /// The end of the span falls past the last representable instant.
    #[error("span starting at {0} ends out of range")]
    OutOfRange(NaiveDateTime),

    /// A serialized instant was malformed.
    #[error("malformed instant {0:?}")]
    MalformedInstant(String),
}

/// The start/end pair of an event.
///
/// Either both ends are known instants with `end >= start`, or neither is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventSpan {
    /// A resolved span in the civil zone.
    Timed {
        start: DateTime<Tz>,
        end: DateTime<Tz>,
    },
    /// No usable date/time could be recovered.
    Unknown,
}

impl EventSpan {
    /// Creates a timed span, or `None` if `end` precedes `start`.
    pub fn timed(start: DateTime<Tz>, end: DateTime<Tz>) -> Option<Self> {
        (end >= start).then_some(Self::Timed { start, end })
    }

    /// Creates a span of `length` beginning at `start`, or `None` if the end
    /// is not representable.
    pub fn starting_at(start: DateTime<Tz>, length: DefaultDuration) -> Option<Self> {
        let end = start.checked_add_signed(length.duration())?;
        Some(Self::Timed { start, end })
    }

    /// Creates a span covering the whole civil day `date`, 00:00:00 to 23:59:59.
    pub fn all_day(date: NaiveDate) -> Result<Self, NormalizeError> {
        let midnight = NaiveTime::from_hms_opt(0, 0, 0).unwrap_or_default();
        let last_second = NaiveTime::from_hms_opt(23, 59, 59).unwrap_or(midnight);
        let start = localize(date, midnight)?;
        let end = localize(date, last_second)?;
        Self::timed(start, end).ok_or(NormalizeError::EndBeforeStart)
    }

    /// Rebuilds a span from its wire form: two ISO-8601 strings, or two empty strings.
    pub fn from_wire(start: &str, end: &str) -> Result<Self, NormalizeError> {
        match (start.trim(), end.trim()) {
            ("", "") => Ok(Self::Unknown),
            (s, e) => {
                let start = parse_instant(s)?;
                let end = parse_instant(e)?;
                Self::timed(start, end).ok_or(NormalizeError::EndBeforeStart)
            }
        }
    }

    /// Returns `true` if the span has resolved instants.
    pub fn is_known(&self) -> bool {
        matches!(self, Self::Timed { .. })
    }

    /// Returns `true` for a span built by [`EventSpan::all_day`].
    pub fn is_all_day(&self) -> bool {
        match self {
            Self::Timed { start, end } => {
                start.date_naive() == end.date_naive()
                    && start.time() == NaiveTime::from_hms_opt(0, 0, 0).unwrap_or_default()
                    && NaiveTime::from_hms_opt(23, 59, 59) == Some(end.time())
            }
            Self::Unknown => false,
        }
    }

    /// Returns the start instant, if known.
    pub fn start(&self) -> Option<&DateTime<Tz>> {
        match self {
            Self::Timed { start, .. } => Some(start),
            Self::Unknown => None,
        }
    }

    /// Returns the end instant, if known.
    pub fn end(&self) -> Option<&DateTime<Tz>> {
        match self {
            Self::Timed { end, .. } => Some(end),
            Self::Unknown => None,
        }
    }

    /// The start as an offset-qualified ISO-8601 string, or `""` when unknown.
    pub fn start_iso(&self) -> String {
        self.start().map(DateTime::to_rfc3339).unwrap_or_default()
    }

    /// The end as an offset-qualified ISO-8601 string, or `""` when unknown.
    pub fn end_iso(&self) -> String {
        self.end().map(DateTime::to_rfc3339).unwrap_or_default()
    }
}

impl fmt::Display for EventSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Timed { start, end } => {
                write!(f, "{} .. {}", start.to_rfc3339(), end.to_rfc3339())
            }
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

fn parse_instant(s: &str) -> Result<DateTime<Tz>, NormalizeError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&HOME_ZONE))
        .map_err(|_| NormalizeError::MalformedInstant(s.to_string()))
}

/// AM/PM marker of a 12-hour clock reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Meridiem {
    Am,
    Pm,
}

impl Meridiem {
    fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "am" => Some(Self::Am),
            "pm" => Some(Self::Pm),
            _ => None,
        }
    }

    fn flipped(self) -> Self {
        match self {
            Self::Am => Self::Pm,
            Self::Pm => Self::Am,
        }
    }

    /// Converts a 12-hour reading to a wall-clock time.
    fn clock(self, hour: u32, minute: u32) -> Result<NaiveTime, NormalizeError> {
        if !(1..=12).contains(&hour) {
            return Err(NormalizeError::InvalidClock { hour, minute });
        }
        let hour = match (self, hour) {
            (Self::Am, 12) => 0,
            (Self::Am, h) => h,
            (Self::Pm, 12) => 12,
            (Self::Pm, h) => h + 12,
        };
        NaiveTime::from_hms_opt(hour, minute, 0)
            .ok_or(NormalizeError::InvalidClock { hour, minute })
    }
}

/// Places a wall-clock reading on `date` in the civil zone.
///
/// Ambiguous readings (DST fall-back) take the earlier instant.
pub fn localize(date: NaiveDate, time: NaiveTime) -> Result<DateTime<Tz>, NormalizeError> {
    let naive = date.and_time(time);
    HOME_ZONE
        .from_local_datetime(&naive)
        .earliest()
        .ok_or(NormalizeError::NonexistentLocalTime(naive))
}

/// Resolves a month name ("January", "jan", "Sept.") to its number.
pub fn parse_month(name: &str) -> Option<u32> {
    let lower = name.trim().trim_end_matches('.').to_ascii_lowercase();
    if lower.len() < 3 {
        return None;
    }
    MONTHS
        .iter()
        .position(|m| m.starts_with(&lower))
        .map(|i| i as u32 + 1)
}

fn clean_date_text(text: &str) -> String {
    text.split_whitespace()
        .map(|word| {
            let word = word.trim_end_matches('.');
            if word.eq_ignore_ascii_case("sept") {
                "Sep"
            } else {
                word
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn parse_with(formats: &[&str], text: &str) -> Option<NaiveDate> {
    let cleaned = clean_date_text(text);
    formats
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(&cleaned, fmt).ok())
}

/// Parses a date header, which must carry a weekday ("Monday, January 12, 2026").
pub fn parse_header_date(text: &str) -> Option<NaiveDate> {
    parse_with(HEADER_FORMATS, text)
}

/// Parses a date in any accepted format.
///
/// Whole-string formats are tried first; failing those, the first
/// `Month Day, Year` found inside longer prose is used.
pub fn parse_date(text: &str) -> Option<NaiveDate> {
    parse_with(DATE_FORMATS, text).or_else(|| {
        let caps = EMBEDDED_DATE.captures(text)?;
        let month = parse_month(&caps[1])?;
        let day = caps[2].parse().ok()?;
        let year = caps[3].parse().ok()?;
        NaiveDate::from_ymd_opt(year, month, day)
    })
}

/// Parses a single `H[:MM] am/pm` token, minutes defaulting to zero.
pub fn parse_clock(text: &str) -> Option<NaiveTime> {
    let text = clean_time_text(text);
    let caps = CLOCK.captures(&text)?;
    let hour = caps[1].parse().ok()?;
    let minute = caps.get(2).map_or(Some(0), |m| m.as_str().parse().ok())?;
    let meridiem = Meridiem::parse(&caps[3])?;
    meridiem.clock(hour, minute).ok()
}

fn clean_time_text(text: &str) -> String {
    let text = text
        .to_ascii_lowercase()
        .replace("a.m.", "am")
        .replace("p.m.", "pm");
    NOON.replace_all(&text, "12:00 pm").into_owned()
}

/// Normalizes a date and optional time string into an [`EventSpan`].
///
/// When `time` is `None` the time patterns are searched for in `date` itself,
/// since detail pages often write both in one string. Failures collapse into
/// [`EventSpan::Unknown`].
pub fn normalize(date: &str, time: Option<&str>, default: DefaultDuration) -> EventSpan {
    match try_normalize(date, time, default) {
        Ok(span) => span,
        Err(err) => {
            debug!(date = %date, time = ?time, error = %err, "date/time not normalized");
            EventSpan::Unknown
        }
    }
}

/// Fallible form of [`normalize`].
pub fn try_normalize(
    date: &str,
    time: Option<&str>,
    default: DefaultDuration,
) -> Result<EventSpan, NormalizeError> {
    let day = parse_date(date).ok_or_else(|| NormalizeError::UnparseableDate(date.to_string()))?;
    normalize_on(day, time.unwrap_or(date), default)
}

/// Normalizes time text against an already-parsed date.
pub fn normalize_on(
    day: NaiveDate,
    time: &str,
    default: DefaultDuration,
) -> Result<EventSpan, NormalizeError> {
    let text = clean_time_text(time);

    if let Some(caps) = TIME_RANGE.captures(&text) {
        let start_hour: u32 = parse_field(&caps[1])?;
        let start_minute: u32 = parse_field(&caps[2])?;
        let end_hour: u32 = parse_field(&caps[4])?;
        let end_minute: u32 = parse_field(&caps[5])?;
        let end_meridiem = Meridiem::parse(&caps[6]).ok_or(NormalizeError::InvalidClock {
            hour: end_hour,
            minute: end_minute,
        })?;
        let explicit_start = caps.get(3).and_then(|m| Meridiem::parse(m.as_str()));

        let end = localize(day, end_meridiem.clock(end_hour, end_minute)?)?;

        return match explicit_start {
            Some(start_meridiem) => {
                let start = localize(day, start_meridiem.clock(start_hour, start_minute)?)?;
                if end >= start {
                    Ok(EventSpan::Timed { start, end })
                } else {
                    // Both sides explicit: an overnight event.
                    let next = day.succ_opt().ok_or(NormalizeError::EndBeforeStart)?;
                    let end = localize(next, end_meridiem.clock(end_hour, end_minute)?)?;
                    EventSpan::timed(start, end).ok_or(NormalizeError::EndBeforeStart)
                }
            }
            None => {
                let start = localize(day, end_meridiem.clock(start_hour, start_minute)?)?;
                if end >= start {
                    return Ok(EventSpan::Timed { start, end });
                }
                let flipped = end_meridiem.flipped().clock(start_hour, start_minute)?;
                let start = localize(day, flipped)?;
                EventSpan::timed(start, end).ok_or(NormalizeError::EndBeforeStart)
            }
        };
    }

    if let Some(caps) = SINGLE_TIME.captures(&text) {
        let hour: u32 = parse_field(&caps[1])?;
        let minute: u32 = parse_field(&caps[2])?;
        let meridiem =
            Meridiem::parse(&caps[3]).ok_or(NormalizeError::InvalidClock { hour, minute })?;
        let start = localize(day, meridiem.clock(hour, minute)?)?;
        return EventSpan::starting_at(start, default)
            .ok_or(NormalizeError::OutOfRange(start.naive_local()));
    }

    EventSpan::all_day(day)
}

fn parse_field(digits: &str) -> Result<u32, NormalizeError> {
    digits
        .parse()
        .map_err(|_| NormalizeError::InvalidClock { hour: 0, minute: 0 })
}
