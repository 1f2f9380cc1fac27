//! caltally-core: calendar event model, title classification and hour
//! aggregation.
//!
//! This crate provides:
//! - `extract_events`: ICS text to classified `Event`s, skipping malformed ones
//! - `classify`: category paths and markers from an event title
//! - `category_hours` / `daily_hours`: totals over an inclusive `TimeRange`
//! - `summarize`: mean, median and trend of a daily series

pub mod aggregate;
pub mod category;
pub mod error;
pub mod event;
pub mod extract;
pub mod range;
pub mod stats;
pub mod time;

pub use aggregate::{
    AggregationConfig, CategoryHours, DailyConfig, DailyHours, category_hours, daily_hours,
    events_between, label_shares,
};
pub use category::{CategoryPath, Classification, classify};
pub use error::{CoreError, Result};
pub use event::Event;
pub use extract::{Extraction, SkippedEvent, extract_events};
pub use range::{Bound, TimeRange, parse_bound};
pub use stats::{SeriesSummary, Trend, summarize};
pub use time::{TimeKind, Timestamp, resolve_timezone};
