//! Event types for scraped calendar events.
//!
//! This module provides the record produced by every extractor:
//! - [`Event`]: A normalized, validated event
//! - [`EventRecord`]: The wire form handed to sinks
//! - [`IdAllocator`]: The run-scoped id counter
//! - [`EventMap`]: Id-keyed events for one run

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::time::{EventSpan, NormalizeError};

/// Summary used when a source gives no usable title.
pub const PLACEHOLDER_SUMMARY: &str = "Unknown Event Name";

/// Run-scoped event identifier.
pub type EventId = u64;

/// Events of one run, keyed by allocator-issued id.
///
/// Iteration follows id order, which is extraction order.
pub type EventMap = BTreeMap<EventId, Event>;

/// Errors raised when a wire record violates the event invariants.
#[derive(Debug, Error)]
pub enum EventError {
    /// The start/end pair is malformed, half-empty, or inverted.
    #[error("invalid start/end: {0}")]
    Span(#[from] NormalizeError),
}

/// A normalized event.
///
/// Text fields are trimmed at construction and the summary is never empty.
/// The start/end pair is an [`EventSpan`], so "one side known, the other not"
/// cannot be represented.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "EventRecord", try_from = "EventRecord")]
pub struct Event {
    summary: String,
    description: String,
    location: String,
    tag: String,
    link: String,
    span: EventSpan,
}

impl Event {
    /// Creates a new event. An empty summary falls back to [`PLACEHOLDER_SUMMARY`].
    pub fn new(summary: impl AsRef<str>, link: impl AsRef<str>, span: EventSpan) -> Self {
        Self {
            summary: String::new(),
            description: String::new(),
            location: String::new(),
            tag: String::new(),
            link: link.as_ref().trim().to_string(),
            span,
        }
        .with_summary(summary)
    }

    /// Builder method to replace the summary, with the same placeholder fallback.
    pub fn with_summary(mut self, summary: impl AsRef<str>) -> Self {
        let summary = summary.as_ref().trim();
        self.summary = if summary.is_empty() {
            PLACEHOLDER_SUMMARY.to_string()
        } else {
            summary.to_string()
        };
        self
    }

    /// Builder method to set the description.
    pub fn with_description(mut self, description: impl AsRef<str>) -> Self {
        self.description = description.as_ref().trim().to_string();
        self
    }

    /// Builder method to set the location.
    pub fn with_location(mut self, location: impl AsRef<str>) -> Self {
        self.location = location.as_ref().trim().to_string();
        self
    }

    /// Builder method to set the category tag.
    pub fn with_tag(mut self, tag: impl AsRef<str>) -> Self {
        self.tag = tag.as_ref().trim().to_string();
        self
    }

    /// Builder method to replace the span.
    pub fn with_span(mut self, span: EventSpan) -> Self {
        self.span = span;
        self
    }

    pub fn summary(&self) -> &str {
        &self.summary
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn link(&self) -> &str {
        &self.link
    }

    pub fn span(&self) -> &EventSpan {
        &self.span
    }
}

/// The wire form of an [`Event`].
///
/// `start` and `end` are ISO-8601 instants with an explicit offset, or both
/// the empty string when the event's time is unknown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    pub summary: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub tag: String,
    pub link: String,
    pub start: String,
    pub end: String,
}

impl From<Event> for EventRecord {
    fn from(event: Event) -> Self {
        Self {
            start: event.span.start_iso(),
            end: event.span.end_iso(),
            summary: event.summary,
            description: event.description,
            location: event.location,
            tag: event.tag,
            link: event.link,
        }
    }
}

impl TryFrom<EventRecord> for Event {
    type Error = EventError;

    fn try_from(record: EventRecord) -> Result<Self, Self::Error> {
        let span = EventSpan::from_wire(&record.start, &record.end)?;
        Ok(Event::new(record.summary, record.link, span)
            .with_description(record.description)
            .with_location(record.location)
            .with_tag(record.tag))
    }
}

/// Monotonic id counter shared by every extractor of one aggregation run.
///
/// The aggregator owns it and lends it to each extractor in turn, so ids are
/// unique across the merged result and follow extraction order.
#[derive(Debug, Default)]
pub struct IdAllocator {
    next: EventId,
}

impl IdAllocator {
    /// Creates an allocator starting at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Issues the next id.
    pub fn allocate(&mut self) -> EventId {
        let id = self.next;
        self.next += 1;
        id
    }

    /// Restarts numbering at zero for a fresh run.
    pub fn reset(&mut self) {
        self.next = 0;
    }

    /// Number of ids issued since the last reset.
    pub fn issued(&self) -> u64 {
        self.next
    }

    /// Inserts `event` into `map` under a freshly allocated id.
    pub fn assign(&mut self, map: &mut EventMap, event: Event) -> EventId {
        let id = self.allocate();
        map.insert(id, event);
        id
    }
}
