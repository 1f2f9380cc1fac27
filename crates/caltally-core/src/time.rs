//! Timestamps as they appear in ICS properties, and their conversion to UTC.

use crate::error::{CoreError, Result};
use chrono::{
    DateTime, Duration, LocalResult, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc,
};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Format of an ICS `DATE` value.
const ICS_DATE: &str = "%Y%m%d";
/// Format of an ICS `DATE-TIME` value without the trailing `Z`.
const ICS_DATE_TIME: &str = "%Y%m%dT%H%M%S";

/// TZID prefixes some clients put in front of IANA names.
const TZID_PREFIXES: &[&str] = &["/mozilla.org/", "/softwarestudio.org/"];

/// Whether a timestamp carries a time of day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeKind {
    Date,
    DateTime,
}

/// A DTSTART/DTEND value: a whole date or an instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Timestamp {
    /// `VALUE=DATE` value, e.g. `20240301`.
    Date(NaiveDate),
    /// Date-time normalized to UTC.
    DateTime(DateTime<Utc>),
}

impl Timestamp {
    /// The instant used for ordering and arithmetic.
    ///
    /// A date is the UTC midnight that starts it.
    #[must_use]
    pub fn instant(&self) -> DateTime<Utc> {
        match self {
            Self::Date(date) => date.and_time(NaiveTime::MIN).and_utc(),
            Self::DateTime(dt) => *dt,
        }
    }

    /// Date or date-time.
    #[must_use]
    pub const fn kind(&self) -> TimeKind {
        match self {
            Self::Date(_) => TimeKind::Date,
            Self::DateTime(_) => TimeKind::DateTime,
        }
    }

    /// Whether this is a date-only value.
    #[must_use]
    pub const fn is_date(&self) -> bool {
        matches!(self, Self::Date(_))
    }

    /// Calendar date of this timestamp as seen from `tz`.
    #[must_use]
    pub fn date_in(&self, tz: Tz) -> NaiveDate {
        match self {
            Self::Date(date) => *date,
            Self::DateTime(dt) => dt.with_timezone(&tz).date_naive(),
        }
    }

    /// Parse an ICS property value.
    ///
    /// `value_date` is true when the property carried `VALUE=DATE`; an
    /// eight digit value is treated as a date either way. `tzid` is the
    /// property's `TZID` parameter, if any. Date-times without `Z` or TZID
    /// are floating and taken as UTC.
    ///
    /// # Errors
    /// Returns `CoreError::UnknownTimezone` for a TZID outside the table and
    /// `CoreError::InvalidTimestamp` for values that do not parse.
    pub fn parse_ics(value: &str, value_date: bool, tzid: Option<&str>) -> Result<Self> {
        let value = value.trim();

        if value_date || (value.len() == 8 && !value.contains('T')) {
            return NaiveDate::parse_from_str(value, ICS_DATE)
                .map(Self::Date)
                .map_err(|e| CoreError::InvalidTimestamp(format!("{value}: {e}")));
        }

        if let Some(utc) = value.strip_suffix('Z') {
            let naive = parse_naive(utc)?;
            return Ok(Self::DateTime(naive.and_utc()));
        }

        let naive = parse_naive(value)?;
        match tzid {
            Some(tzid) => {
                let tz = resolve_timezone(tzid)?;
                localize(tz, naive).map(Self::DateTime)
            }
            None => Ok(Self::DateTime(naive.and_utc())),
        }
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Date(date) => write!(f, "{}", date.format("%Y-%m-%d")),
            Self::DateTime(dt) => write!(f, "{}", dt.format("%Y-%m-%d %H:%M UTC")),
        }
    }
}

fn parse_naive(value: &str) -> Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(value, ICS_DATE_TIME)
        .map_err(|e| CoreError::InvalidTimestamp(format!("{value}: {e}")))
}

/// Look up a TZID in the IANA timezone table.
///
/// # Errors
/// Returns `CoreError::UnknownTimezone` if the identifier is not in the table.
pub fn resolve_timezone(tzid: &str) -> Result<Tz> {
    let trimmed = tzid.trim().trim_matches('"');
    let stripped = TZID_PREFIXES
        .iter()
        .find_map(|prefix| trimmed.strip_prefix(prefix))
        .unwrap_or(trimmed);

    stripped
        .parse::<Tz>()
        .map_err(|_| CoreError::UnknownTimezone(tzid.to_string()))
}

/// Convert a wall-clock time in `tz` to UTC.
///
/// Times inside a DST gap are moved forward one hour; times inside a fold
/// take the earlier instant.
///
/// # Errors
/// Returns `CoreError::InvalidTimestamp` if no instant corresponds to the time.
pub fn localize(tz: Tz, naive: NaiveDateTime) -> Result<DateTime<Utc>> {
    match tz.from_local_datetime(&naive) {
        LocalResult::Single(dt) => Ok(dt.with_timezone(&Utc)),
        LocalResult::Ambiguous(earliest, _) => Ok(earliest.with_timezone(&Utc)),
        LocalResult::None => tz
            .from_local_datetime(&(naive + Duration::hours(1)))
            .earliest()
            .map(|dt| dt.with_timezone(&Utc))
            .ok_or_else(|| CoreError::InvalidTimestamp(format!("{naive} in {tz}"))),
    }
}

/// Parse an RFC 5545 `DURATION` value such as `PT1H30M`, `P1D` or `P2W`.
///
/// # Errors
/// Returns `CoreError::InvalidTimestamp` if the value is not a duration or
/// does not fit in one.
pub fn parse_ics_duration(value: &str) -> Result<Duration> {
    let invalid = || CoreError::InvalidTimestamp(format!("duration {value}"));

    let value = value.trim();
    let (negative, rest) = match value.as_bytes().first() {
        Some(b'-') => (true, &value[1..]),
        Some(b'+') => (false, &value[1..]),
        _ => (false, value),
    };
    let rest = rest.strip_prefix('P').ok_or_else(invalid)?;

    let mut total = Duration::zero();
    let mut number = String::new();
    let mut in_time = false;
    let mut saw_component = false;

    for c in rest.chars() {
        match c {
            '0'..='9' => number.push(c),
            'T' if number.is_empty() && !in_time => in_time = true,
            unit => {
                let n: i64 = number.parse().map_err(|_| invalid())?;
                number.clear();
                saw_component = true;
                let component = match (unit, in_time) {
                    ('W', false) => Duration::try_weeks(n),
                    ('D', false) => Duration::try_days(n),
                    ('H', true) => Duration::try_hours(n),
                    ('M', true) => Duration::try_minutes(n),
                    ('S', true) => Duration::try_seconds(n),
                    _ => return Err(invalid()),
                };
                total = component
                    .and_then(|c| total.checked_add(&c))
                    .ok_or_else(invalid)?;
            }
        }
    }

    if !number.is_empty() || !saw_component {
        return Err(invalid());
    }

    Ok(if negative { -total } else { total })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn utc(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    #[test]
    fn test_parse_date_value() {
        let ts = Timestamp::parse_ics("20240301", false, None).unwrap();
        assert_eq!(ts, Timestamp::Date(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()));
        assert_eq!(ts.instant(), utc("2024-03-01T00:00:00Z"));
        assert!(ts.is_date());
    }

    #[test]
    fn test_parse_utc_and_floating() {
        let ts = Timestamp::parse_ics("20240301T093000Z", false, None).unwrap();
        assert_eq!(ts, Timestamp::DateTime(utc("2024-03-01T09:30:00Z")));

        let floating = Timestamp::parse_ics("20240301T093000", false, None).unwrap();
        assert_eq!(floating, ts);
    }

    #[test]
    fn test_parse_with_tzid() {
        let ts = Timestamp::parse_ics("20240301T093000", false, Some("Europe/Berlin")).unwrap();
        assert_eq!(ts.instant(), utc("2024-03-01T08:30:00Z"));

        let prefixed =
            Timestamp::parse_ics("20240301T093000", false, Some("/mozilla.org/Europe/Berlin"))
                .unwrap();
        assert_eq!(prefixed, ts);
    }

    #[test]
    fn test_unknown_tzid() {
        let err = Timestamp::parse_ics("20240301T093000", false, Some("Mars/Olympus")).unwrap_err();
        assert_eq!(err, CoreError::UnknownTimezone("Mars/Olympus".into()));
    }

    #[test]
    fn test_dst_gap_moves_forward() {
        // 02:30 does not exist in Berlin on 2024-03-31
        let naive = NaiveDate::from_ymd_opt(2024, 3, 31)
            .unwrap()
            .and_hms_opt(2, 30, 0)
            .unwrap();
        let dt = localize(chrono_tz::Europe::Berlin, naive).unwrap();
        assert_eq!(dt, utc("2024-03-31T01:30:00Z"));
    }

    #[test]
    fn test_invalid_value() {
        assert!(matches!(
            Timestamp::parse_ics("2024-03-01", false, None),
            Err(CoreError::InvalidTimestamp(_))
        ));
    }

    #[test]
    fn test_parse_duration() {
        assert_eq!(parse_ics_duration("PT1H30M").unwrap(), Duration::minutes(90));
        assert_eq!(parse_ics_duration("P1D").unwrap(), Duration::days(1));
        assert_eq!(parse_ics_duration("P2W").unwrap(), Duration::weeks(2));
        assert_eq!(parse_ics_duration("P1DT2H").unwrap(), Duration::hours(26));
        assert_eq!(parse_ics_duration("-PT15M").unwrap(), -Duration::minutes(15));
        assert!(parse_ics_duration("1H").is_err());
        assert!(parse_ics_duration("P").is_err());
        assert!(parse_ics_duration("PT5").is_err());
    }

    #[test]
    fn test_oversized_duration_is_an_error() {
        assert!(matches!(
            parse_ics_duration("P99999999999999W"),
            Err(CoreError::InvalidTimestamp(_))
        ));
        assert!(parse_ics_duration("PT9223372036854775807S").is_err());
        assert!(parse_ics_duration("P99999999999999999999D").is_err());
    }

    #[test]
    fn test_date_in_timezone() {
        let ts = Timestamp::DateTime(utc("2024-03-01T23:30:00Z"));
        assert_eq!(
            ts.date_in(chrono_tz::Europe::Berlin),
            NaiveDate::from_ymd_opt(2024, 3, 2).unwrap()
        );
        assert_eq!(ts.date_in(chrono_tz::UTC), NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
    }
}
