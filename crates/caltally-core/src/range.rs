//! Inclusive time ranges used to select events.

use crate::error::{CoreError, Result};
use crate::event::Event;
use crate::time::localize;
use chrono::{DateTime, Datelike, Days, Duration, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A closed interval `[start, end]`.
///
/// An event is inside the range only when it lies entirely within it;
/// events straddling either bound are excluded. A range whose start is after
/// its end contains nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

/// Which side of a range a bound is parsed for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bound {
    Start,
    End,
}

impl TimeRange {
    #[must_use]
    pub const fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    /// Whether `event` starts and ends inside this range.
    #[must_use]
    pub fn contains(&self, event: &Event) -> bool {
        event.start().instant() >= self.start && event.end().instant() <= self.end
    }

    /// The week (Monday to Sunday, wall clock in `tz`) containing `date`,
    /// shifted by `offset` weeks.
    ///
    /// # Errors
    /// Returns `CoreError::InvalidBound` if the shifted week is outside the
    /// supported date range or a bound cannot be placed in `tz`.
    pub fn week_of(date: NaiveDate, tz: Tz, offset: i64) -> Result<Self> {
        let out_of_range = || CoreError::InvalidBound(format!("week offset {offset}"));

        let monday = Duration::try_weeks(offset)
            .and_then(|shift| {
                date.checked_sub_days(Days::new(u64::from(
                    date.weekday().num_days_from_monday(),
                )))?
                .checked_add_signed(shift)
            })
            .ok_or_else(out_of_range)?;
        let sunday = monday
            .checked_add_days(Days::new(6))
            .ok_or_else(out_of_range)?;

        let start = localize(tz, monday.and_time(NaiveTime::MIN))
            .map_err(|e| CoreError::InvalidBound(e.to_string()))?;
        let end = localize(tz, sunday.and_time(end_of_day()))
            .map_err(|e| CoreError::InvalidBound(e.to_string()))?;

        Ok(Self::new(start, end))
    }

    /// Build a range from two user-supplied bounds.
    ///
    /// # Errors
    /// Returns `CoreError::InvalidBound` if either bound does not parse.
    pub fn parse(from: &str, to: &str, tz: Tz) -> Result<Self> {
        Ok(Self::new(
            parse_bound(from, tz, Bound::Start)?,
            parse_bound(to, tz, Bound::End)?,
        ))
    }

    /// Pick a range from optional query inputs: explicit `from`/`to` bounds,
    /// or the week `week` weeks away from the one containing `today`.
    ///
    /// # Errors
    /// Returns `CoreError::InvalidBound` if only one bound is given, if bounds
    /// and a week are both given, or if a bound does not parse.
    pub fn select(
        from: Option<&str>,
        to: Option<&str>,
        week: Option<i64>,
        tz: Tz,
        today: NaiveDate,
    ) -> Result<Self> {
        match (from, to, week) {
            (Some(from), Some(to), None) => Self::parse(from, to, tz),
            (None, None, week) => Self::week_of(today, tz, week.unwrap_or(0)),
            (Some(_), Some(_), Some(_)) => Err(CoreError::InvalidBound(
                "a week cannot be combined with from/to".into(),
            )),
            _ => Err(CoreError::InvalidBound(
                "from and to must be given together".into(),
            )),
        }
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} .. {}",
            self.start.format("%Y-%m-%d %H:%M UTC"),
            self.end.format("%Y-%m-%d %H:%M UTC")
        )
    }
}

fn end_of_day() -> NaiveTime {
    NaiveTime::from_hms_micro_opt(23, 59, 59, 999_999).unwrap_or(NaiveTime::MIN)
}

/// Parse a range bound.
///
/// Accepts RFC 3339 (`2024-03-04T09:00:00+01:00`), a local date-time in `tz`
/// (`2024-03-04T09:00:00` or `2024-03-04 09:00`), or a bare date. A bare
/// date means the start of the day for [`Bound::Start`] and the last
/// instant of the day for [`Bound::End`].
///
/// # Errors
/// Returns `CoreError::InvalidBound` if the value matches none of these.
pub fn parse_bound(value: &str, tz: Tz, bound: Bound) -> Result<DateTime<Utc>> {
    let value = value.trim();
    let invalid = || CoreError::InvalidBound(value.to_string());

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt.with_timezone(&Utc));
    }

    let naive = ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok());

    let naive = match naive {
        Some(naive) => naive,
        None => {
            let date = NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|_| invalid())?;
            match bound {
                Bound::Start => date.and_time(NaiveTime::MIN),
                Bound::End => date.and_time(end_of_day()),
            }
        }
    };

    localize(tz, naive).map_err(|_| invalid())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::Timestamp;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, 0).unwrap()
    }

    fn event(start: DateTime<Utc>, end: DateTime<Utc>) -> Event {
        Event::new("x:", "", Timestamp::DateTime(start), Timestamp::DateTime(end)).unwrap()
    }

    #[test]
    fn test_contains_is_inclusive() {
        let range = TimeRange::new(utc(2024, 3, 4, 0, 0), utc(2024, 3, 5, 0, 0));

        assert!(range.contains(&event(utc(2024, 3, 4, 0, 0), utc(2024, 3, 5, 0, 0))));
        assert!(range.contains(&event(utc(2024, 3, 4, 9, 0), utc(2024, 3, 4, 10, 0))));
        assert!(!range.contains(&event(utc(2024, 3, 3, 23, 0), utc(2024, 3, 4, 1, 0))));
        assert!(!range.contains(&event(utc(2024, 3, 4, 23, 0), utc(2024, 3, 5, 1, 0))));
    }

    #[test]
    fn test_inverted_range_contains_nothing() {
        let range = TimeRange::new(utc(2024, 3, 5, 0, 0), utc(2024, 3, 4, 0, 0));
        assert!(!range.contains(&event(utc(2024, 3, 4, 9, 0), utc(2024, 3, 4, 10, 0))));
    }

    #[test]
    fn test_week_of() {
        // Wednesday
        let date = NaiveDate::from_ymd_opt(2024, 3, 6).unwrap();
        let week = TimeRange::week_of(date, chrono_tz::UTC, 0).unwrap();

        assert_eq!(week.start, utc(2024, 3, 4, 0, 0));
        assert_eq!(week.end.date_naive(), NaiveDate::from_ymd_opt(2024, 3, 10).unwrap());
        assert!(week.end > utc(2024, 3, 10, 23, 59));

        let previous = TimeRange::week_of(date, chrono_tz::UTC, -1).unwrap();
        assert_eq!(previous.start, utc(2024, 2, 26, 0, 0));

        let berlin = TimeRange::week_of(date, chrono_tz::Europe::Berlin, 0).unwrap();
        assert_eq!(berlin.start, utc(2024, 3, 3, 23, 0));
    }

    #[test]
    fn test_parse_bounds() {
        let tz = chrono_tz::UTC;
        assert_eq!(
            parse_bound("2024-03-04", tz, Bound::Start).unwrap(),
            utc(2024, 3, 4, 0, 0)
        );
        assert!(parse_bound("2024-03-04", tz, Bound::End).unwrap() > utc(2024, 3, 4, 23, 59));
        assert_eq!(
            parse_bound("2024-03-04T09:30:00+01:00", tz, Bound::Start).unwrap(),
            utc(2024, 3, 4, 8, 30)
        );
        assert_eq!(
            parse_bound("2024-03-04 09:30", chrono_tz::Europe::Berlin, Bound::End).unwrap(),
            utc(2024, 3, 4, 8, 30)
        );
        assert!(matches!(
            parse_bound("last tuesday", tz, Bound::Start),
            Err(CoreError::InvalidBound(_))
        ));
    }

    #[test]
    fn test_parse_range() {
        let range = TimeRange::parse("2024-03-04", "2024-03-04", chrono_tz::UTC).unwrap();
        assert!(range.contains(&event(utc(2024, 3, 4, 9, 0), utc(2024, 3, 4, 17, 0))));
    }

    #[test]
    fn test_week_offset_out_of_range() {
        let today = NaiveDate::from_ymd_opt(2024, 3, 6).unwrap();

        for offset in [i64::MAX, i64::MAX / 2, i64::MIN, 100_000_000] {
            assert!(matches!(
                TimeRange::week_of(today, chrono_tz::UTC, offset),
                Err(CoreError::InvalidBound(_))
            ));
        }
        assert!(matches!(
            TimeRange::select(None, None, Some(i64::MAX / 2), chrono_tz::UTC, today),
            Err(CoreError::InvalidBound(_))
        ));
    }

    #[test]
    fn test_select() {
        let tz = chrono_tz::UTC;
        let today = NaiveDate::from_ymd_opt(2024, 3, 6).unwrap();

        let week = TimeRange::select(None, None, None, tz, today).unwrap();
        assert_eq!(week.start, utc(2024, 3, 4, 0, 0));

        let next = TimeRange::select(None, None, Some(1), tz, today).unwrap();
        assert_eq!(next.start, utc(2024, 3, 11, 0, 0));

        let explicit =
            TimeRange::select(Some("2024-01-01"), Some("2024-01-31"), None, tz, today).unwrap();
        assert_eq!(explicit.start, utc(2024, 1, 1, 0, 0));

        assert!(matches!(
            TimeRange::select(Some("2024-01-01"), None, None, tz, today),
            Err(CoreError::InvalidBound(_))
        ));
        assert!(matches!(
            TimeRange::select(Some("2024-01-01"), Some("2024-01-31"), Some(0), tz, today),
            Err(CoreError::InvalidBound(_))
        ));
    }
}
