//! ICS event extraction.
//!
//! Walks every calendar in the input, validates its timezone definitions
//! and turns each VEVENT into an [`Event`]. A malformed event is skipped and
//! reported; an unparsable input or an unknown timezone fails the whole
//! extraction.

use crate::error::{CoreError, Result};
use crate::event::Event;
use crate::time::{Timestamp, parse_ics_duration, resolve_timezone};
use ical::parser::ical::component::{IcalEvent, IcalTimeZone};
use ical::property::Property;
use serde::Serialize;
use tracing::{debug, info, warn};

/// Separator used when an event has several SUMMARY properties.
const SUMMARY_SEPARATOR: &str = " - ";

/// An event left out of the extraction, and why.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedEvent {
    /// Position of the VEVENT in the input, counting from zero.
    pub index: usize,
    /// UID of the event, when it had one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uid: Option<String>,
    /// Why the event was skipped.
    pub reason: String,
}

/// Output of [`extract_events`].
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Extraction {
    /// Top-level METHOD property, if present.
    pub method: Option<String>,
    /// Events in input order.
    pub events: Vec<Event>,
    /// Events that were malformed.
    pub skipped: Vec<SkippedEvent>,
}

/// Extract events from raw ICS text.
///
/// # Errors
/// Returns `CoreError::Parse` if the text is not a calendar and
/// `CoreError::UnknownTimezone` if a VTIMEZONE or TZID parameter names a
/// timezone outside the table.
pub fn extract_events(ics: &str) -> Result<Extraction> {
    let parser = ical::IcalParser::new(ics.as_bytes());
    let mut extraction = Extraction::default();
    let mut index = 0;

    for calendar in parser {
        let calendar = calendar.map_err(|e| CoreError::Parse(e.to_string()))?;

        if let Some(method) = find_value(&calendar.properties, "METHOD") {
            extraction.method = Some(method.to_string());
        }

        for timezone in &calendar.timezones {
            validate_timezone(timezone)?;
        }

        for event in &calendar.events {
            match parse_event(event) {
                Ok(parsed) => extraction.events.push(parsed),
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => {
                    let uid = find_value(&event.properties, "UID").map(String::from);
                    warn!(index, uid = ?uid, error = %e, "Skipping malformed event");
                    extraction.skipped.push(SkippedEvent {
                        index,
                        uid,
                        reason: e.to_string(),
                    });
                }
            }
            index += 1;
        }
    }

    info!(
        events = extraction.events.len(),
        skipped = extraction.skipped.len(),
        "Extracted calendar events"
    );

    Ok(extraction)
}

fn validate_timezone(timezone: &IcalTimeZone) -> Result<()> {
    let Some(tzid) = find_value(&timezone.properties, "TZID") else {
        return Ok(());
    };
    let tz = resolve_timezone(tzid)?;
    debug!(tzid, resolved = %tz, "Validated timezone");
    Ok(())
}

fn parse_event(event: &IcalEvent) -> Result<Event> {
    let uid = find_value(&event.properties, "UID").unwrap_or_default();
    let missing = |property| CoreError::MissingProperty {
        uid: uid.to_string(),
        property,
    };

    let start = find_property(&event.properties, "DTSTART").ok_or_else(|| missing("DTSTART"))?;
    let start = parse_timestamp(start).ok_or_else(|| missing("DTSTART"))??;

    let end = match find_property(&event.properties, "DTEND").and_then(parse_timestamp) {
        Some(end) => end?,
        None => {
            let duration =
                find_value(&event.properties, "DURATION").ok_or_else(|| missing("DTEND"))?;
            end_from_duration(start, duration)?
        }
    };

    let summaries: Vec<String> = event
        .properties
        .iter()
        .filter(|p| p.name.eq_ignore_ascii_case("SUMMARY"))
        .filter_map(|p| p.value.as_deref())
        .map(unescape_text)
        .collect();
    let title = summaries.join(SUMMARY_SEPARATOR);

    let description = find_value(&event.properties, "DESCRIPTION")
        .map(unescape_text)
        .unwrap_or_default();

    if uid.is_empty() {
        Event::new(title, description, start, end)
    } else {
        Event::with_uid(uid, title, description, start, end)
    }
}

/// Parse a DTSTART/DTEND property. `None` when the property has no value.
fn parse_timestamp(property: &Property) -> Option<Result<Timestamp>> {
    let value = property.value.as_deref()?;
    let value_date = find_param(property, "VALUE").is_some_and(|v| v.eq_ignore_ascii_case("DATE"));
    let tzid = find_param(property, "TZID");
    Some(Timestamp::parse_ics(value, value_date, tzid))
}

fn end_from_duration(start: Timestamp, duration: &str) -> Result<Timestamp> {
    let delta = parse_ics_duration(duration)?;
    let end = match start {
        Timestamp::Date(date) => date.checked_add_signed(delta).map(Timestamp::Date),
        Timestamp::DateTime(dt) => dt.checked_add_signed(delta).map(Timestamp::DateTime),
    };
    end.ok_or_else(|| CoreError::InvalidTimestamp(format!("{start} plus duration {duration}")))
}

fn find_property<'a>(properties: &'a [Property], name: &str) -> Option<&'a Property> {
    properties.iter().find(|p| p.name.eq_ignore_ascii_case(name))
}

fn find_value<'a>(properties: &'a [Property], name: &str) -> Option<&'a str> {
    find_property(properties, name).and_then(|p| p.value.as_deref())
}

fn find_param<'a>(property: &'a Property, name: &str) -> Option<&'a str> {
    property
        .params
        .as_ref()?
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(name))
        .and_then(|(_, values)| values.first())
        .map(String::as_str)
}

/// Undo RFC 5545 TEXT escaping.
fn unescape_text(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n' | 'N') => out.push('\n'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}
