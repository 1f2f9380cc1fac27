//! Output formatting for the CLI.

use anyhow::Result;
use caltally_core::{CategoryHours, DailyHours, Event, SeriesSummary, SkippedEvent};
use chrono::NaiveDate;
use console::style;
use serde::Serialize;

/// Output format for CLI responses.
#[derive(Debug, Clone, Copy, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable output
    #[default]
    Human,
    /// JSON output
    Json,
    /// YAML output
    Yaml,
}

/// Print a value in the specified format.
pub fn print<T: Serialize + HumanDisplay>(value: &T, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Human => println!("{}", value.human_display()),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(value)?),
        OutputFormat::Yaml => print!("{}", serde_yaml::to_string(value)?),
    }
    Ok(())
}

/// Print a list in the specified format.
pub fn print_list<T: Serialize + HumanDisplay>(values: &[T], format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Human => {
            for value in values {
                println!("{}", value.human_display());
            }
        }
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(values)?),
        OutputFormat::Yaml => print!("{}", serde_yaml::to_string(values)?),
    }
    Ok(())
}

/// Print a success message.
pub fn print_success(message: &str, format: OutputFormat) {
    match format {
        OutputFormat::Human => println!("{message}"),
        OutputFormat::Json => {
            println!("{}", serde_json::json!({ "status": "ok", "message": message }));
        }
        OutputFormat::Yaml => {
            println!("status: ok\nmessage: {message}");
        }
    }
}

/// Trait for human-readable display.
pub trait HumanDisplay {
    fn human_display(&self) -> String;
}

/// Display name of a category label; the empty label collects events
/// without a category at the requested depth.
pub fn label_name(label: &str) -> &str {
    if label.is_empty() { "(none)" } else { label }
}

impl HumanDisplay for &Event {
    fn human_display(&self) -> String {
        let categories = self
            .categories()
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(" ");
        let mut flags = String::new();
        if self.mixed() {
            flags.push_str(" [mixed]");
        }
        if self.all_day() {
            flags.push_str(" [all-day]");
        }

        format!(
            "{:<22} {:>6.2}h  {:<24} {}{}",
            self.start().to_string(),
            self.hours(),
            categories,
            self.title(),
            style(flags).dim()
        )
    }
}

impl HumanDisplay for SkippedEvent {
    fn human_display(&self) -> String {
        format!(
            "#{:<5} {:<36} {}",
            self.index,
            self.uid.as_deref().unwrap_or("-"),
            self.reason
        )
    }
}

/// One row of a category-hours report.
#[derive(Debug, Serialize)]
pub struct CategoryRow {
    pub category: String,
    pub hours: f64,
    pub percent: f64,
}

/// Rows sorted by hours, largest first.
pub fn category_rows(totals: &CategoryHours) -> Vec<CategoryRow> {
    let sum: f64 = totals.values().sum();
    let mut rows: Vec<CategoryRow> = totals
        .iter()
        .map(|(category, hours)| CategoryRow {
            category: category.clone(),
            hours: *hours,
            percent: if sum > 0.0 { hours / sum * 100.0 } else { 0.0 },
        })
        .collect();
    rows.sort_by(|a, b| b.hours.total_cmp(&a.hours).then_with(|| a.category.cmp(&b.category)));
    rows
}

impl HumanDisplay for CategoryRow {
    fn human_display(&self) -> String {
        format!(
            "{:<24} {:>8.2} hrs {:>6.1}%",
            label_name(&self.category),
            self.hours,
            self.percent
        )
    }
}

/// One row of a daily series.
#[derive(Debug, Serialize)]
pub struct DayRow {
    pub date: NaiveDate,
    pub hours: f64,
}

pub fn day_rows(series: &DailyHours) -> Vec<DayRow> {
    series
        .iter()
        .map(|(date, hours)| DayRow {
            date: *date,
            hours: *hours,
        })
        .collect()
}

impl HumanDisplay for DayRow {
    fn human_display(&self) -> String {
        format!(
            "{} {:>6.2} hrs  {}",
            self.date.format("%a %Y-%m-%d"),
            self.hours,
            bar(self.hours)
        )
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn bar(hours: f64) -> String {
    "#".repeat((hours * 2.0).round().max(0.0) as usize)
}

impl HumanDisplay for SeriesSummary {
    fn human_display(&self) -> String {
        let mut out = format!(
            "Days: {}  Total: {:.2} hrs  Mean: {:.2} hrs  Median: {:.2} hrs",
            self.days, self.total, self.mean, self.median
        );
        if let Some(trend) = &self.trend {
            out.push_str(&format!("  Trend: {:+.3} hrs/day", trend.slope));
        }
        out
    }
}

/// Print a header line for human output.
pub fn print_header(text: &str, format: OutputFormat) {
    if matches!(format, OutputFormat::Human) {
        println!("{}", style(text).bold());
        println!("{}", "-".repeat(60));
    }
}
