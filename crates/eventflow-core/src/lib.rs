//! Core types: events, id allocation, date/time normalization, tracing

pub mod event;
pub mod time;
pub mod tracing;

pub use event::{
    Event, EventError, EventId, EventMap, EventRecord, IdAllocator, PLACEHOLDER_SUMMARY,
};
pub use time::{
    DefaultDuration, EventSpan, HOME_ZONE, NormalizeError, localize, normalize, normalize_on,
    parse_clock, parse_date, parse_header_date, parse_month, try_normalize,
};
pub use tracing::{TracingConfig, TracingError, TracingOutputFormat, init_tracing};
