//! Static HTML chart page: a category pie chart and a daily line chart.

mod html;

use caltally_core::{CategoryHours, DailyHours, SeriesSummary};
use std::fmt;

/// Everything the chart page shows.
pub struct ChartData<'a> {
    pub title: String,
    pub totals: &'a CategoryHours,
    pub series: &'a DailyHours,
    pub summary: Option<&'a SeriesSummary>,
}

/// Render the full page.
///
/// # Errors
///
/// Returns an error if writing into the page buffer fails.
pub fn render(data: &ChartData<'_>) -> Result<String, fmt::Error> {
    let pie = if data.totals.is_empty() {
        html::empty_note("No categorized events in range")
    } else {
        html::pie_svg(data.totals)?
    };

    let line = match data.summary {
        Some(summary) => html::line_svg(data.series, summary)?,
        None => html::empty_note("No daily hours in range"),
    };

    Ok(html::page(&data.title, &pie, &line))
}
