//! Calendar event model.

use crate::category::{self, CategoryPath};
use crate::error::{CoreError, Result};
use crate::time::Timestamp;
use chrono::Duration;
use serde::Serialize;

/// Events lasting at least this many hours count as all-day.
const ALL_DAY_HOURS: i64 = 24;

/// One calendar occurrence, classified from its title.
///
/// Built once at extraction time and never modified afterwards.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Event {
    #[serde(skip_serializing_if = "Option::is_none")]
    uid: Option<String>,
    title: String,
    description: String,
    start: Timestamp,
    end: Timestamp,
    #[serde(rename = "duration_secs", serialize_with = "serialize_secs")]
    duration: Duration,
    all_day: bool,
    categories: Vec<CategoryPath>,
    mixed: bool,
    described: bool,
}

fn serialize_secs<S: serde::Serializer>(
    duration: &Duration,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_i64(duration.num_seconds())
}

impl Event {
    /// Create an event and classify its title.
    ///
    /// # Errors
    /// Returns `CoreError::TimeKindMismatch` when one of `start`/`end` is a
    /// date and the other a date-time.
    pub fn new(
        title: impl Into<String>,
        description: impl Into<String>,
        start: Timestamp,
        end: Timestamp,
    ) -> Result<Self> {
        Self::build(None, title.into(), description.into(), start, end)
    }

    /// Same as [`Event::new`], recording the event's UID.
    ///
    /// # Errors
    /// See [`Event::new`].
    pub fn with_uid(
        uid: impl Into<String>,
        title: impl Into<String>,
        description: impl Into<String>,
        start: Timestamp,
        end: Timestamp,
    ) -> Result<Self> {
        Self::build(
            Some(uid.into()),
            title.into(),
            description.into(),
            start,
            end,
        )
    }

    fn build(
        uid: Option<String>,
        title: String,
        description: String,
        start: Timestamp,
        end: Timestamp,
    ) -> Result<Self> {
        if start.kind() != end.kind() {
            return Err(CoreError::TimeKindMismatch {
                uid: uid.unwrap_or_default(),
            });
        }

        let duration = end.instant() - start.instant();
        let classification = category::classify(&title);

        Ok(Self {
            uid,
            title,
            description,
            start,
            end,
            duration,
            all_day: duration.num_hours() >= ALL_DAY_HOURS,
            categories: classification.categories,
            mixed: classification.mixed,
            described: classification.described,
        })
    }

    #[must_use]
    pub fn uid(&self) -> Option<&str> {
        self.uid.as_deref()
    }

    /// Raw title, possibly empty.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    #[must_use]
    pub const fn start(&self) -> Timestamp {
        self.start
    }

    #[must_use]
    pub const fn end(&self) -> Timestamp {
        self.end
    }

    /// `end - start`.
    #[must_use]
    pub const fn duration(&self) -> Duration {
        self.duration
    }

    /// Duration in fractional hours.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn hours(&self) -> f64 {
        self.duration.num_seconds() as f64 / 3600.0
    }

    /// Lasts 24 hours or more.
    #[must_use]
    pub const fn all_day(&self) -> bool {
        self.all_day
    }

    #[must_use]
    pub fn categories(&self) -> &[CategoryPath] {
        &self.categories
    }

    /// Duration is split evenly across the categories.
    #[must_use]
    pub const fn mixed(&self) -> bool {
        self.mixed
    }

    /// Title carried the `(desc.)` marker.
    #[must_use]
    pub const fn described(&self) -> bool {
        self.described
    }

    /// Labels at `depth`, one per category path, in title order.
    #[must_use]
    pub fn labels(&self, depth: usize) -> Vec<&str> {
        self.categories.iter().map(|path| path.level(depth)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone, Utc};
    use pretty_assertions::assert_eq;

    fn at(h: u32, m: u32) -> Timestamp {
        Timestamp::DateTime(Utc.with_ymd_and_hms(2024, 3, 4, h, m, 0).unwrap())
    }

    fn day(d: u32) -> Timestamp {
        Timestamp::Date(NaiveDate::from_ymd_opt(2024, 3, d).unwrap())
    }

    #[test]
    fn test_new_event() {
        let event = Event::new("Work:Ops: deploy", "", at(9, 0), at(10, 30)).unwrap();

        assert_eq!(event.duration(), Duration::minutes(90));
        assert!((event.hours() - 1.5).abs() < 1e-9);
        assert!(!event.all_day());
        assert!(!event.mixed());
        assert_eq!(event.categories(), &[CategoryPath::new(["work", "ops"])]);
        assert_eq!(event.labels(1), vec!["ops"]);
        assert_eq!(event.labels(2), vec![""]);
    }

    #[test]
    fn test_all_day_by_duration() {
        let event = Event::new("holiday:", "", day(4), day(5)).unwrap();
        assert!(event.all_day());
        assert_eq!(event.duration(), Duration::hours(24));

        let long = Event::new(
            "travel:",
            "",
            at(8, 0),
            Timestamp::DateTime(Utc.with_ymd_and_hms(2024, 3, 5, 8, 0, 0).unwrap()),
        )
        .unwrap();
        assert!(long.all_day());
    }

    #[test]
    fn test_kind_mismatch() {
        let err = Event::with_uid("abc", "x", "", day(4), at(10, 0)).unwrap_err();
        assert_eq!(err, CoreError::TimeKindMismatch { uid: "abc".into() });
    }

    #[test]
    fn test_serialization() {
        let event = Event::with_uid("u1", "gym:", "legs", at(9, 0), at(10, 0)).unwrap();
        let json = serde_json::to_string(&event).unwrap();

        assert!(json.contains(r#""uid":"u1""#));
        assert!(json.contains(r#""duration_secs":3600"#));
        assert!(json.contains(r#""categories":[["gym"]]"#));
    }
}
