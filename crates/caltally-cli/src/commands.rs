//! CLI command implementations.

use crate::output::{self, OutputFormat};
use crate::{GroupArgs, RangeArgs, chart};
use anyhow::{Context, Result};
use caltally_core::{AggregationConfig, DailyConfig, TimeRange, summarize};
use caltally_fs::{Calendar, CaltallyConfig, Workspace};
use chrono::Utc;
use chrono_tz::Tz;
use console::style;
use serde::Serialize;
use std::fs;
use std::path::Path;
use tracing::info;

/// A loaded calendar plus the configuration queries are run with.
struct Session {
    config: CaltallyConfig,
    timezone: Tz,
    calendar: Calendar,
}

fn open_session(path: &Path, ics: Option<&Path>) -> Result<Session> {
    let ws = Workspace::open_or_default(path).context("Failed to open workspace")?;
    let timezone = ws
        .config()
        .timezone()
        .context("Invalid timezone in workspace config")?;
    let calendar = ws.load_calendar(ics).context("Failed to load calendar")?;

    Ok(Session {
        config: ws.config().clone(),
        timezone,
        calendar,
    })
}

/// Resolve the range flags: explicit bounds, or a week relative to today.
fn resolve_range(args: &RangeArgs, tz: Tz) -> Result<TimeRange> {
    let today = Utc::now().with_timezone(&tz).date_naive();
    TimeRange::select(
        args.from.as_deref(),
        args.to.as_deref(),
        args.week,
        tz,
        today,
    )
    .context("Invalid range")
}

fn aggregation(config: &CaltallyConfig, range: TimeRange, group: &GroupArgs) -> AggregationConfig {
    let mut aggregation = config.aggregation(range);
    if let Some(depth) = group.depth {
        aggregation.depth = depth;
    }
    aggregation
        .ignore
        .extend(group.ignore.iter().map(|l| l.to_lowercase()));
    if group.include_all_day {
        aggregation.include_all_day = true;
    }
    aggregation
}

fn daily_config(
    config: &CaltallyConfig,
    range: TimeRange,
    tz: Tz,
    categories: &[String],
) -> DailyConfig {
    let mut daily = config.daily(range, tz);
    if !categories.is_empty() {
        daily.categories = categories.iter().map(|c| c.to_lowercase()).collect();
    }
    daily
}

/// Initialize a new workspace.
pub fn init(path: &Path, format: OutputFormat) -> Result<()> {
    let ws = Workspace::init(path).context("Failed to initialize workspace")?;
    output::print_success(
        &format!(
            "Initialized workspace at {} (calendar: {})",
            path.display(),
            ws.calendar_path().display()
        ),
        format,
    );
    Ok(())
}

#[derive(Serialize)]
struct CheckReport<'a> {
    source: Option<String>,
    method: Option<&'a str>,
    events: usize,
    skipped: &'a [caltally_core::SkippedEvent],
}

/// Report how the calendar parsed.
pub fn check(path: &Path, ics: Option<&Path>, format: OutputFormat) -> Result<()> {
    let session = open_session(path, ics)?;
    let calendar = &session.calendar;

    let report = CheckReport {
        source: calendar.source().map(|p| p.display().to_string()),
        method: calendar.method(),
        events: calendar.events().len(),
        skipped: calendar.skipped(),
    };

    match format {
        OutputFormat::Human => {
            println!(
                "{} events loaded from {}",
                style(report.events).green().bold(),
                report.source.as_deref().unwrap_or("-")
            );
            if let Some(method) = report.method {
                println!("METHOD: {method}");
            }
            if report.skipped.is_empty() {
                println!("No malformed events.");
            } else {
                println!();
                output::print_header(
                    &format!("{} skipped events", report.skipped.len()),
                    format,
                );
                output::print_list(report.skipped, format)?;
            }
        }
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Yaml => print!("{}", serde_yaml::to_string(&report)?),
    }
    Ok(())
}

/// List events inside a range.
pub fn events(
    path: &Path,
    ics: Option<&Path>,
    range: &RangeArgs,
    format: OutputFormat,
) -> Result<()> {
    let session = open_session(path, ics)?;
    let range = resolve_range(range, session.timezone)?;

    let events = session.calendar.events_between(&range);
    if events.is_empty() {
        output::print_success("No events found", format);
        return Ok(());
    }

    output::print_header(&format!("Events {range}"), format);
    output::print_list(&events, format)
}

/// Total hours per category.
pub fn hours(
    path: &Path,
    ics: Option<&Path>,
    range: &RangeArgs,
    group: &GroupArgs,
    format: OutputFormat,
) -> Result<()> {
    let session = open_session(path, ics)?;
    let range = resolve_range(range, session.timezone)?;
    let config = aggregation(&session.config, range, group);

    let totals = session.calendar.category_hours(&config);
    info!(categories = totals.len(), depth = config.depth, "Computed category hours");

    if totals.is_empty() {
        output::print_success("No categorized events found", format);
        return Ok(());
    }

    let rows = output::category_rows(&totals);
    output::print_header(&format!("Hours by category (depth {}) {range}", config.depth), format);
    output::print_list(&rows, format)?;

    if matches!(format, OutputFormat::Human) {
        let sum: f64 = totals.values().sum();
        println!("{}", "-".repeat(60));
        println!("{:<24} {:>8.2} hrs", "total", sum);
    }
    Ok(())
}

#[derive(Serialize)]
struct DailyReport {
    days: Vec<output::DayRow>,
    summary: Option<caltally_core::SeriesSummary>,
}

/// Hours per day in selected top-level categories.
pub fn daily(
    path: &Path,
    ics: Option<&Path>,
    range: &RangeArgs,
    categories: &[String],
    format: OutputFormat,
) -> Result<()> {
    let session = open_session(path, ics)?;
    let range = resolve_range(range, session.timezone)?;
    let config = daily_config(&session.config, range, session.timezone, categories);

    let series = session.calendar.daily_hours(&config);
    let report = DailyReport {
        days: output::day_rows(&series),
        summary: summarize(&series),
    };

    match format {
        OutputFormat::Human => {
            let names: Vec<&str> = config.categories.iter().map(String::as_str).collect();
            output::print_header(&format!("Daily hours in {} {range}", names.join(", ")), format);
            output::print_list(&report.days, format)?;
            match &report.summary {
                Some(summary) => {
                    println!("{}", "-".repeat(60));
                    output::print(summary, format)?;
                }
                None => println!("No matching events."),
            }
        }
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Yaml => print!("{}", serde_yaml::to_string(&report)?),
    }
    Ok(())
}

/// Write the static chart page.
pub fn chart(
    path: &Path,
    ics: Option<&Path>,
    range: &RangeArgs,
    group: &GroupArgs,
    categories: &[String],
    out: &Path,
    format: OutputFormat,
) -> Result<()> {
    let session = open_session(path, ics)?;
    let range = resolve_range(range, session.timezone)?;

    let totals = session
        .calendar
        .category_hours(&aggregation(&session.config, range, group));
    let series = session
        .calendar
        .daily_hours(&daily_config(&session.config, range, session.timezone, categories));
    let summary = summarize(&series);

    let page = chart::render(&chart::ChartData {
        title: format!("caltally {range}"),
        totals: &totals,
        series: &series,
        summary: summary.as_ref(),
    })
    .context("Failed to render chart")?;
    fs::write(out, page).with_context(|| format!("Failed to write {}", out.display()))?;

    info!(path = %out.display(), "Wrote chart");
    output::print_success(&format!("Wrote chart to {}", out.display()), format);
    Ok(())
}

/// Start the query server.
pub fn serve(path: &Path, ics: Option<&Path>, host: &str, port: u16) -> Result<()> {
    let session = open_session(path, ics)?;
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async {
        caltally_toolserver::serve(
            session.calendar,
            session.config,
            session.timezone,
            host,
            port,
        )
        .await
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_explicit_range() {
        let args = RangeArgs {
            from: Some("2024-03-04".into()),
            to: Some("2024-03-10".into()),
            week: None,
        };
        let range = resolve_range(&args, chrono_tz::UTC).unwrap();
        assert_eq!(range.start, Utc.with_ymd_and_hms(2024, 3, 4, 0, 0, 0).unwrap());
        assert!(range.end > Utc.with_ymd_and_hms(2024, 3, 10, 23, 59, 0).unwrap());
    }

    #[test]
    fn test_huge_week_offset_is_an_error() {
        let args = RangeArgs {
            week: Some(i64::MAX),
            ..RangeArgs::default()
        };
        assert!(resolve_range(&args, chrono_tz::UTC).is_err());
    }

    #[test]
    fn test_default_range_is_current_week() {
        let range = resolve_range(&RangeArgs::default(), chrono_tz::UTC).unwrap();
        let now = Utc::now();
        assert!(range.start <= now && now <= range.end);
    }

    #[test]
    fn test_group_flags_override_config() {
        let mut config = CaltallyConfig::default();
        config.report.ignore = vec!["sleep".into()];
        let group = GroupArgs {
            depth: Some(2),
            ignore: vec!["misc".into()],
            include_all_day: true,
        };
        let epoch = chrono::DateTime::<Utc>::UNIX_EPOCH;

        let agg = aggregation(&config, TimeRange::new(epoch, epoch), &group);
        assert_eq!(agg.depth, 2);
        assert!(agg.ignore.contains("sleep") && agg.ignore.contains("misc"));
        assert!(agg.include_all_day);
    }

    #[test]
    fn test_hours_on_file() {
        let tmp = tempfile::TempDir::new().unwrap();
        let ics = tmp.path().join("cal.ics");
        fs::write(
            &ics,
            "BEGIN:VCALENDAR\nVERSION:2.0\nPRODID:-//t//EN\nBEGIN:VEVENT\nDTSTART:20240304T090000Z\nDTEND:20240304T100000Z\nSUMMARY:work:\nEND:VEVENT\nEND:VCALENDAR\n",
        )
        .unwrap();

        let args = RangeArgs {
            from: Some("2024-03-01".into()),
            to: Some("2024-03-31".into()),
            week: None,
        };
        hours(tmp.path(), Some(&ics), &args, &GroupArgs::default(), OutputFormat::Json).unwrap();

        let out = tmp.path().join("chart.html");
        chart(
            tmp.path(),
            Some(&ics),
            &args,
            &GroupArgs::default(),
            &[],
            &out,
            OutputFormat::Human,
        )
        .unwrap();
        assert!(fs::read_to_string(out).unwrap().contains("<svg"));
    }
}
