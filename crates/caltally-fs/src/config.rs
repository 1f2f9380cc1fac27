//! Workspace configuration.

use caltally_core::{AggregationConfig, DailyConfig, TimeRange, resolve_timezone};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Workspace configuration stored in `.caltally/config.yml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaltallyConfig {
    /// Configuration version.
    #[serde(default = "default_version")]
    pub version: u32,

    /// Where the calendar lives and how to read its days.
    #[serde(default)]
    pub calendar: CalendarSettings,

    /// Defaults for category-hour reports.
    #[serde(default)]
    pub report: ReportDefaults,

    /// Defaults for the daily hours series.
    #[serde(default)]
    pub daily: DailyDefaults,
}

fn default_version() -> u32 {
    1
}

/// Calendar location and display timezone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarSettings {
    /// ICS file, relative to the workspace root.
    #[serde(default = "default_calendar_path")]
    pub path: PathBuf,

    /// IANA timezone used for week boundaries and day buckets.
    #[serde(default = "default_timezone")]
    pub timezone: String,
}

fn default_calendar_path() -> PathBuf {
    PathBuf::from("calendar.ics")
}

fn default_timezone() -> String {
    "UTC".to_string()
}

impl Default for CalendarSettings {
    fn default() -> Self {
        Self {
            path: default_calendar_path(),
            timezone: default_timezone(),
        }
    }
}

/// Category-hour report defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportDefaults {
    /// Hierarchy depth to group by.
    #[serde(default)]
    pub depth: usize,

    /// Labels hidden from reports.
    #[serde(default)]
    pub ignore: Vec<String>,

    /// Whether events lasting 24 hours or more count.
    #[serde(default)]
    pub include_all_day: bool,
}

impl Default for ReportDefaults {
    fn default() -> Self {
        Self {
            depth: 0,
            ignore: Vec::new(),
            include_all_day: false,
        }
    }
}

/// Daily series defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyDefaults {
    /// Top-level categories counted in the series.
    #[serde(default = "default_daily_categories")]
    pub categories: Vec<String>,
}

fn default_daily_categories() -> Vec<String> {
    vec!["work".to_string()]
}

impl Default for DailyDefaults {
    fn default() -> Self {
        Self {
            categories: default_daily_categories(),
        }
    }
}

impl Default for CaltallyConfig {
    fn default() -> Self {
        Self {
            version: 1,
            calendar: CalendarSettings::default(),
            report: ReportDefaults::default(),
            daily: DailyDefaults::default(),
        }
    }
}

impl CaltallyConfig {
    /// Resolve the configured timezone.
    ///
    /// # Errors
    /// Returns `CoreError::UnknownTimezone` if the name is not in the table.
    pub fn timezone(&self) -> caltally_core::Result<Tz> {
        resolve_timezone(&self.calendar.timezone)
    }

    /// Aggregation settings for `range` from the report defaults.
    ///
    /// Labels are lowercased to match classified titles.
    #[must_use]
    pub fn aggregation(&self, range: TimeRange) -> AggregationConfig {
        let config = AggregationConfig::new(range)
            .with_depth(self.report.depth)
            .with_ignored(self.report.ignore.iter().map(|l| l.to_lowercase()));
        if self.report.include_all_day {
            config.with_all_day()
        } else {
            config
        }
    }

    /// Daily series settings for `range` from the daily defaults.
    #[must_use]
    pub fn daily(&self, range: TimeRange, timezone: Tz) -> DailyConfig {
        DailyConfig {
            range,
            categories: self.daily.categories.iter().map(|c| c.to_lowercase()).collect(),
            timezone,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: CaltallyConfig =
            serde_yaml::from_str("calendar:\n  timezone: Europe/Berlin\nreport:\n  depth: 1\n")
                .unwrap();

        assert_eq!(config.version, 1);
        assert_eq!(config.calendar.path, PathBuf::from("calendar.ics"));
        assert_eq!(config.timezone().unwrap(), chrono_tz::Europe::Berlin);
        assert_eq!(config.report.depth, 1);
        assert!(!config.report.include_all_day);
        assert_eq!(config.daily.categories, vec!["work"]);
    }

    #[test]
    fn test_round_trip_default() {
        let yaml = serde_yaml::to_string(&CaltallyConfig::default()).unwrap();
        let parsed: CaltallyConfig = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(parsed, CaltallyConfig::default());
    }

    #[test]
    fn test_bad_timezone() {
        let mut config = CaltallyConfig::default();
        config.calendar.timezone = "Atlantis/Deep".to_string();
        assert!(config.timezone().is_err());
    }

    #[test]
    fn test_aggregation_from_defaults() {
        let mut config = CaltallyConfig::default();
        config.report.ignore = vec!["sleep".to_string()];
        config.report.include_all_day = true;

        let epoch = chrono::DateTime::<chrono::Utc>::UNIX_EPOCH;
        let range = TimeRange::new(epoch, epoch);
        let aggregation = config.aggregation(range);

        assert!(aggregation.ignore.contains("sleep"));
        assert!(aggregation.include_all_day);
        assert_eq!(aggregation.depth, 0);
        assert!(!CaltallyConfig::default().aggregation(range).include_all_day);
    }
}
