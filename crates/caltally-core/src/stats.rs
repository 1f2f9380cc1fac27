//! Summary statistics for a daily hours series.

use crate::aggregate::DailyHours;
use chrono::{Datelike, NaiveDate};
use serde::Serialize;

/// Least-squares line through a series, over day ordinals.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Trend {
    /// Change in hours per day.
    pub slope: f64,
    /// Value at day ordinal zero.
    pub intercept: f64,
}

impl Trend {
    /// Fitted value on `date`.
    #[must_use]
    pub fn value_at(&self, date: NaiveDate) -> f64 {
        self.slope.mul_add(ordinal(date), self.intercept)
    }
}

/// Mean, median and trend of a series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SeriesSummary {
    pub days: usize,
    pub total: f64,
    pub mean: f64,
    pub median: f64,
    /// Absent with fewer than two days.
    pub trend: Option<Trend>,
}

/// Summarize a series. `None` when it is empty.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn summarize(series: &DailyHours) -> Option<SeriesSummary> {
    if series.is_empty() {
        return None;
    }

    let n = series.len() as f64;
    let total: f64 = series.values().sum();

    let mut sorted: Vec<f64> = series.values().copied().collect();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    let median = if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    };

    Some(SeriesSummary {
        days: series.len(),
        total,
        mean: total / n,
        median,
        trend: fit(series),
    })
}

#[allow(clippy::cast_precision_loss)]
fn fit(series: &DailyHours) -> Option<Trend> {
    if series.len() < 2 {
        return None;
    }

    let n = series.len() as f64;
    let mean_x = series.keys().map(|d| ordinal(*d)).sum::<f64>() / n;
    let mean_y = series.values().sum::<f64>() / n;

    let (sxy, sxx) = series.iter().fold((0.0, 0.0), |(sxy, sxx), (date, hours)| {
        let dx = ordinal(*date) - mean_x;
        (dx.mul_add(hours - mean_y, sxy), dx.mul_add(dx, sxx))
    });

    if sxx == 0.0 {
        return None;
    }

    let slope = sxy / sxx;
    Some(Trend {
        slope,
        intercept: slope.mul_add(-mean_x, mean_y),
    })
}

fn ordinal(date: NaiveDate) -> f64 {
    f64::from(date.num_days_from_ce())
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    fn series(values: &[(u32, f64)]) -> DailyHours {
        values
            .iter()
            .map(|(d, h)| (NaiveDate::from_ymd_opt(2024, 3, *d).unwrap(), *h))
            .collect()
    }

    #[test]
    fn test_empty_series() {
        assert!(summarize(&DailyHours::new()).is_none());
    }

    #[test]
    fn test_single_day_has_no_trend() {
        let summary = summarize(&series(&[(4, 3.0)])).unwrap();
        assert_eq!(summary.days, 1);
        assert!((summary.mean - 3.0).abs() < EPS);
        assert!((summary.median - 3.0).abs() < EPS);
        assert!(summary.trend.is_none());
    }

    #[test]
    fn test_mean_and_median() {
        let summary = summarize(&series(&[(4, 1.0), (5, 2.0), (6, 10.0), (7, 3.0)])).unwrap();
        assert!((summary.total - 16.0).abs() < EPS);
        assert!((summary.mean - 4.0).abs() < EPS);
        assert!((summary.median - 2.5).abs() < EPS);
    }

    #[test]
    fn test_linear_trend() {
        // one extra hour per day, with a gap
        let s = series(&[(4, 2.0), (5, 3.0), (8, 6.0)]);
        let trend = summarize(&s).unwrap().trend.unwrap();

        assert!((trend.slope - 1.0).abs() < EPS);
        let date = NaiveDate::from_ymd_opt(2024, 3, 10).unwrap();
        assert!((trend.value_at(date) - 8.0).abs() < 1e-6);
    }
}
