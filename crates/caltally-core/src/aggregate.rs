//! Range filtering and per-category hour totals.

use crate::event::Event;
use crate::range::TimeRange;
use chrono::NaiveDate;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Hours per category label.
pub type CategoryHours = BTreeMap<String, f64>;

/// Hours per calendar day.
pub type DailyHours = BTreeMap<NaiveDate, f64>;

/// Parameters of a category-hours query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregationConfig {
    /// Events must lie entirely inside this range.
    pub range: TimeRange,
    /// Hierarchy level to group by; 0 is the top level.
    #[serde(default)]
    pub depth: usize,
    /// Labels removed from the result after totals are computed.
    #[serde(default)]
    pub ignore: BTreeSet<String>,
    /// Whether events lasting a day or more contribute. Off by default.
    #[serde(default)]
    pub include_all_day: bool,
}

impl AggregationConfig {
    /// Top-level totals over `range`, nothing ignored, all-day events left out.
    #[must_use]
    pub const fn new(range: TimeRange) -> Self {
        Self {
            range,
            depth: 0,
            ignore: BTreeSet::new(),
            include_all_day: false,
        }
    }

    #[must_use]
    pub const fn with_depth(mut self, depth: usize) -> Self {
        self.depth = depth;
        self
    }

    #[must_use]
    pub fn with_ignored(mut self, labels: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.ignore = labels.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub const fn with_all_day(mut self) -> Self {
        self.include_all_day = true;
        self
    }
}

/// Parameters of a daily-hours query.
#[derive(Debug, Clone, PartialEq)]
pub struct DailyConfig {
    /// Events must lie entirely inside this range.
    pub range: TimeRange,
    /// Top-level labels that count.
    pub categories: BTreeSet<String>,
    /// Timezone whose calendar days bucket the events.
    pub timezone: Tz,
}

/// Events lying entirely inside `range`, in input order.
#[must_use]
pub fn events_between<'a>(events: &'a [Event], range: &TimeRange) -> Vec<&'a Event> {
    events.iter().filter(|e| range.contains(e)).collect()
}

/// Hours an event contributes to each of its labels at `depth`.
///
/// A plain event gives its full duration once to each distinct label. A
/// mixed event with `k` labels gives `duration / k` to every label,
/// repeated labels included, so its shares always sum to its duration.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn label_shares(event: &Event, depth: usize) -> Vec<(&str, f64)> {
    let labels = event.labels(depth);
    let hours = event.hours();

    if event.mixed() {
        let share = hours / labels.len().max(1) as f64;
        return labels.into_iter().map(|label| (label, share)).collect();
    }

    let mut seen = BTreeSet::new();
    labels
        .into_iter()
        .filter(|label| seen.insert(*label))
        .map(|label| (label, hours))
        .collect()
}

/// Total hours per label at the configured depth.
///
/// Every label encountered gets an entry, including `""` for paths shallower
/// than the depth. Ignored labels are dropped at the end, after all shares
/// have been computed.
#[must_use]
pub fn category_hours(events: &[Event], config: &AggregationConfig) -> CategoryHours {
    let mut totals = CategoryHours::new();

    for event in events_between(events, &config.range) {
        if event.all_day() && !config.include_all_day {
            continue;
        }
        for (label, hours) in label_shares(event, config.depth) {
            *totals.entry(label.to_string()).or_insert(0.0) += hours;
        }
    }

    for label in &config.ignore {
        totals.remove(label);
    }

    totals
}

/// Hours per day spent in the configured top-level categories.
///
/// All-day and date-only events are left out. Each event is booked on the
/// day it starts.
#[must_use]
pub fn daily_hours(events: &[Event], config: &DailyConfig) -> DailyHours {
    let mut days = DailyHours::new();

    for event in events_between(events, &config.range) {
        if event.all_day() || event.start().is_date() {
            continue;
        }

        let hours: f64 = label_shares(event, 0)
            .into_iter()
            .filter(|(label, _)| config.categories.contains(*label))
            .map(|(_, hours)| hours)
            .sum();

        if hours > 0.0 {
            *days
                .entry(event.start().date_in(config.timezone))
                .or_insert(0.0) += hours;
        }
    }

    days
}
