//! A calendar loaded from an ICS export.

use crate::error::{FsError, Result};
use caltally_core::{
    AggregationConfig, CategoryHours, DailyConfig, DailyHours, Event, Extraction, SkippedEvent,
    TimeRange, category_hours, daily_hours, events_between, extract_events,
};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// The in-memory event collection, built once and queried afterwards.
#[derive(Debug, Clone)]
pub struct Calendar {
    /// File the calendar was read from, if any.
    source: Option<PathBuf>,
    extraction: Extraction,
}

impl Calendar {
    /// Read and extract an ICS file.
    ///
    /// # Errors
    /// Returns `FsError::CalendarNotFound` if the file is missing, an IO error
    /// if it cannot be read, and a core error if the calendar is unusable
    /// (unparsable text or unknown timezone).
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        if !path.is_file() {
            return Err(FsError::CalendarNotFound(path.to_path_buf()));
        }

        let text = fs::read_to_string(path)?;
        debug!(path = %path.display(), bytes = text.len(), "Read calendar file");

        let mut calendar = Self::from_ics(&text)?;
        calendar.source = Some(path.to_path_buf());

        info!(
            path = %path.display(),
            events = calendar.events().len(),
            skipped = calendar.skipped().len(),
            "Loaded calendar"
        );

        Ok(calendar)
    }

    /// Extract a calendar from ICS text already in memory.
    ///
    /// # Errors
    /// Returns a core error if the text is unparsable or names an unknown
    /// timezone.
    pub fn from_ics(text: &str) -> Result<Self> {
        Ok(Self {
            source: None,
            extraction: extract_events(text)?,
        })
    }

    #[must_use]
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    /// All well-formed events, in file order.
    #[must_use]
    pub fn events(&self) -> &[Event] {
        &self.extraction.events
    }

    /// Events that were left out as malformed.
    #[must_use]
    pub fn skipped(&self) -> &[SkippedEvent] {
        &self.extraction.skipped
    }

    /// The calendar's METHOD property.
    #[must_use]
    pub fn method(&self) -> Option<&str> {
        self.extraction.method.as_deref()
    }

    /// Events lying entirely inside `range`.
    #[must_use]
    pub fn events_between(&self, range: &TimeRange) -> Vec<&Event> {
        events_between(self.events(), range)
    }

    /// Hours per category label.
    #[must_use]
    pub fn category_hours(&self, config: &AggregationConfig) -> CategoryHours {
        category_hours(self.events(), config)
    }

    /// Hours per day in the configured categories.
    #[must_use]
    pub fn daily_hours(&self, config: &DailyConfig) -> DailyHours {
        daily_hours(self.events(), config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use caltally_core::CoreError;
    use chrono::{TimeZone, Utc};
    use tempfile::TempDir;

    const ICS: &str = "BEGIN:VCALENDAR
VERSION:2.0
PRODID:-//test//EN
BEGIN:VEVENT
UID:a
DTSTART:20240304T090000Z
DTEND:20240304T110000Z
SUMMARY:work:ops: deploy
END:VEVENT
BEGIN:VEVENT
UID:b
DTEND:20240305T110000Z
SUMMARY:broken:
END:VEVENT
BEGIN:VEVENT
UID:c
DTSTART:20240305T180000Z
DTEND:20240305T190000Z
SUMMARY:gym:
END:VEVENT
END:VCALENDAR
";

    #[test]
    fn test_load_from_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("cal.ics");
        fs::write(&path, ICS).unwrap();

        let calendar = Calendar::load(&path).unwrap();
        assert_eq!(calendar.source(), Some(path.as_path()));
        assert_eq!(calendar.events().len(), 2);
        assert_eq!(calendar.skipped().len(), 1);
        assert_eq!(calendar.skipped()[0].uid.as_deref(), Some("b"));
    }

    #[test]
    fn test_missing_file() {
        let tmp = TempDir::new().unwrap();
        let result = Calendar::load(tmp.path().join("nope.ics"));
        assert!(matches!(result, Err(FsError::CalendarNotFound(_))));
    }

    #[test]
    fn test_unknown_timezone_fails_load() {
        let text = ICS.replace(
            "PRODID:-//test//EN\n",
            "PRODID:-//test//EN\nBEGIN:VTIMEZONE\nTZID:Nowhere/Land\nBEGIN:STANDARD\nDTSTART:19700101T000000\nTZOFFSETFROM:+0000\nTZOFFSETTO:+0000\nEND:STANDARD\nEND:VTIMEZONE\n",
        );
        let result = Calendar::from_ics(&text);
        assert!(matches!(
            result,
            Err(FsError::Core(CoreError::UnknownTimezone(_)))
        ));
    }

    #[test]
    fn test_queries() {
        let calendar = Calendar::from_ics(ICS).unwrap();
        let range = TimeRange::new(
            Utc.with_ymd_and_hms(2024, 3, 4, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2024, 3, 5, 12, 0, 0).unwrap(),
        );

        assert_eq!(calendar.events_between(&range).len(), 1);

        let totals = calendar.category_hours(&AggregationConfig::new(range));
        assert_eq!(totals.len(), 1);
        assert!((totals["work"] - 2.0).abs() < 1e-9);
    }
}
