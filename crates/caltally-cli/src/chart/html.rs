use crate::output::{category_rows, label_name};
use caltally_core::{CategoryHours, DailyHours, SeriesSummary};
use std::f64::consts::{FRAC_PI_2, TAU};
use std::fmt::{self, Write};

const PALETTE: &[&str] = &[
    "#4e79a7", "#f28e2b", "#e15759", "#76b7b2", "#59a14f", "#edc948", "#b07aa1", "#ff9da7",
    "#9c755f", "#bab0ac",
];

const PIE_SIZE: f64 = 420.0;
const PIE_RADIUS: f64 = 150.0;

const LINE_WIDTH: f64 = 720.0;
const LINE_HEIGHT: f64 = 320.0;
const MARGIN: f64 = 40.0;

const MEAN_COLOR: &str = "#59a14f";
const MEDIAN_COLOR: &str = "#edc948";
const TREND_COLOR: &str = "#e15759";

pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

pub fn page(title: &str, pie: &str, line: &str) -> String {
    let title = escape(title);
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>{title}</title>
<style>
body {{ font-family: sans-serif; margin: 2em; color: #222; }}
section {{ margin-bottom: 3em; }}
svg text {{ font-size: 12px; }}
.note {{ color: #888; font-style: italic; }}
</style>
</head>
<body>
<h1>{title}</h1>
<section>
<h2>Hours by category</h2>
{pie}
</section>
<section>
<h2>Daily hours</h2>
{line}
</section>
</body>
</html>
"#
    )
}

pub fn empty_note(text: &str) -> String {
    format!(r#"<p class="note">{}</p>"#, escape(text))
}

fn point(angle: f64, radius: f64) -> (f64, f64) {
    let center = PIE_SIZE / 2.0;
    (
        radius.mul_add(angle.cos(), center),
        radius.mul_add(angle.sin(), center),
    )
}

/// Pie chart with one slice per label, labelled with hours and share.
pub fn pie_svg(totals: &CategoryHours) -> Result<String, fmt::Error> {
    let rows = category_rows(totals);
    let center = PIE_SIZE / 2.0;
    let mut svg = String::new();
    writeln!(
        svg,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{PIE_SIZE}" height="{PIE_SIZE}" viewBox="0 0 {PIE_SIZE} {PIE_SIZE}">"#
    )?;

    // A lone slice covers the circle; an arc with equal endpoints draws nothing.
    if let [row] = rows.as_slice() {
        writeln!(
            svg,
            r#"<circle cx="{center}" cy="{center}" r="{PIE_RADIUS}" fill="{}"/>"#,
            PALETTE[0]
        )?;
        writeln!(
            svg,
            r#"<text x="{center}" y="{center}" text-anchor="middle">{}: {:.2} hrs / 100%</text>"#,
            escape(label_name(&row.category)),
            row.hours
        )?;
        svg.push_str("</svg>");
        return Ok(svg);
    }

    let mut angle = -FRAC_PI_2;
    for (i, row) in rows.iter().enumerate() {
        let sweep = row.percent / 100.0 * TAU;
        if sweep <= 0.0 {
            continue;
        }
        let (x1, y1) = point(angle, PIE_RADIUS);
        let (x2, y2) = point(angle + sweep, PIE_RADIUS);
        let large = u8::from(sweep > std::f64::consts::PI);
        writeln!(
            svg,
            r##"<path d="M {center:.2} {center:.2} L {x1:.2} {y1:.2} A {PIE_RADIUS} {PIE_RADIUS} 0 {large} 1 {x2:.2} {y2:.2} Z" fill="{}" stroke="#fff"/>"##,
            PALETTE[i % PALETTE.len()]
        )?;

        let (lx, ly) = point(sweep.mul_add(0.5, angle), PIE_RADIUS * 0.65);
        writeln!(
            svg,
            r#"<text x="{lx:.2}" y="{ly:.2}" text-anchor="middle">{}: {:.2} hrs / {:.1}%</text>"#,
            escape(label_name(&row.category)),
            row.hours,
            row.percent
        )?;
        angle += sweep;
    }

    svg.push_str("</svg>");
    Ok(svg)
}

struct Scale {
    first: i64,
    days: f64,
    max: f64,
}

impl Scale {
    #[allow(clippy::cast_precision_loss)]
    fn x(&self, offset: i64) -> f64 {
        let width = 2.0f64.mul_add(-MARGIN, LINE_WIDTH);
        if self.days <= 0.0 {
            return MARGIN + width / 2.0;
        }
        ((offset - self.first) as f64 / self.days).mul_add(width, MARGIN)
    }

    fn y(&self, hours: f64) -> f64 {
        let height = 2.0f64.mul_add(-MARGIN, LINE_HEIGHT);
        (hours / self.max).mul_add(-height, LINE_HEIGHT - MARGIN)
    }
}

fn horizontal(
    svg: &mut String,
    scale: &Scale,
    value: f64,
    color: &str,
    label: &str,
) -> fmt::Result {
    let y = scale.y(value);
    writeln!(
        svg,
        r#"<line x1="{MARGIN}" y1="{y:.2}" x2="{:.2}" y2="{y:.2}" stroke="{color}" stroke-dasharray="6 4"/>"#,
        LINE_WIDTH - MARGIN
    )?;
    writeln!(
        svg,
        r#"<text x="{:.2}" y="{:.2}" text-anchor="end" fill="{color}">{label} {value:.2}</text>"#,
        LINE_WIDTH - MARGIN,
        y - 4.0
    )
}

/// Line chart of hours per day with mean, median, and trend overlays.
#[allow(clippy::cast_precision_loss)]
pub fn line_svg(series: &DailyHours, summary: &SeriesSummary) -> Result<String, fmt::Error> {
    use chrono::Datelike;

    let offsets: Vec<(i64, f64)> = series
        .iter()
        .map(|(date, hours)| (i64::from(date.num_days_from_ce()), *hours))
        .collect();
    let first = offsets.first().map_or(0, |(d, _)| *d);
    let last = offsets.last().map_or(0, |(d, _)| *d);
    let peak = offsets.iter().map(|(_, h)| *h).fold(0.0, f64::max);
    let scale = Scale {
        first,
        days: (last - first) as f64,
        max: if peak > 0.0 { peak * 1.1 } else { 1.0 },
    };

    let mut svg = String::new();
    writeln!(
        svg,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{LINE_WIDTH}" height="{LINE_HEIGHT}" viewBox="0 0 {LINE_WIDTH} {LINE_HEIGHT}">"#
    )?;
    writeln!(
        svg,
        r##"<line x1="{MARGIN}" y1="{0:.2}" x2="{1:.2}" y2="{0:.2}" stroke="#999"/>"##,
        LINE_HEIGHT - MARGIN,
        LINE_WIDTH - MARGIN
    )?;

    let points = offsets
        .iter()
        .map(|(d, h)| format!("{:.2},{:.2}", scale.x(*d), scale.y(*h)))
        .collect::<Vec<_>>()
        .join(" ");
    writeln!(
        svg,
        r##"<polyline points="{points}" fill="none" stroke="#4e79a7" stroke-width="2"/>"##
    )?;

    for ((d, h), date) in offsets.iter().zip(series.keys()) {
        let (x, y) = (scale.x(*d), scale.y(*h));
        writeln!(
            svg,
            r##"<circle cx="{x:.2}" cy="{y:.2}" r="3" fill="#4e79a7"><title>{date}: {h:.2} hrs</title></circle>"##
        )?;
    }

    horizontal(&mut svg, &scale, summary.mean, MEAN_COLOR, "mean")?;
    horizontal(&mut svg, &scale, summary.median, MEDIAN_COLOR, "median")?;

    if let (Some(trend), Some(start), Some(end)) =
        (summary.trend, series.keys().next(), series.keys().next_back())
    {
        writeln!(
            svg,
            r#"<line x1="{:.2}" y1="{:.2}" x2="{:.2}" y2="{:.2}" stroke="{TREND_COLOR}" stroke-width="2"/>"#,
            scale.x(first),
            scale.y(trend.value_at(*start)),
            scale.x(last),
            scale.y(trend.value_at(*end))
        )?;
    }

    if let (Some(start), Some(end)) = (series.keys().next(), series.keys().next_back()) {
        writeln!(
            svg,
            r#"<text x="{MARGIN}" y="{:.2}">{start}</text>"#,
            LINE_HEIGHT - MARGIN / 3.0
        )?;
        writeln!(
            svg,
            r#"<text x="{:.2}" y="{:.2}" text-anchor="end">{end}</text>"#,
            LINE_WIDTH - MARGIN,
            LINE_HEIGHT - MARGIN / 3.0
        )?;
    }

    svg.push_str("</svg>");
    Ok(svg)
}

#[cfg(test)]
mod tests {
    use super::*;
    use caltally_core::summarize;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_escape() {
        assert_eq!(escape("a<b & \"c\""), "a&lt;b &amp; &quot;c&quot;");
    }

    #[test]
    fn test_single_slice_is_circle() {
        let totals: CategoryHours = [("work".to_string(), 4.0)].into_iter().collect();
        let svg = pie_svg(&totals).unwrap();

        assert!(svg.contains("<circle"));
        assert!(!svg.contains("<path"));
        assert!(svg.contains("work: 4.00 hrs / 100%"));
    }

    #[test]
    fn test_slices_and_labels() {
        let totals: CategoryHours = [
            ("work".to_string(), 3.0),
            (String::new(), 1.0),
            ("<x>".to_string(), 0.0),
        ]
        .into_iter()
        .collect();
        let svg = pie_svg(&totals).unwrap();

        assert_eq!(svg.matches("<path").count(), 2);
        assert!(svg.contains("work: 3.00 hrs / 75.0%"));
        assert!(svg.contains("(none): 1.00 hrs / 25.0%"));
        assert!(!svg.contains("<x>"));
    }

    #[test]
    fn test_line_chart_overlays() {
        let series: DailyHours = (1..=4)
            .map(|d| (NaiveDate::from_ymd_opt(2024, 3, d).unwrap(), f64::from(d)))
            .collect();
        let summary = summarize(&series).unwrap();
        let svg = line_svg(&series, &summary).unwrap();

        assert!(svg.contains("<polyline"));
        assert_eq!(svg.matches("stroke-dasharray").count(), 2);
        assert!(svg.contains(TREND_COLOR));
        assert!(svg.contains("mean 2.50"));
        assert!(svg.contains("2024-03-01"));
    }

    #[test]
    fn test_line_chart_single_day() {
        let series: DailyHours = [(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(), 2.0)]
            .into_iter()
            .collect();
        let summary = summarize(&series).unwrap();
        let svg = line_svg(&series, &summary).unwrap();

        assert!(!svg.contains("NaN"));
        assert!(!svg.contains(TREND_COLOR));
    }
}
