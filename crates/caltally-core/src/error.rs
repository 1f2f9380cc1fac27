//! Error types for caltally-core.

use thiserror::Error;

/// Result type alias for caltally-core operations.
pub type Result<T> = std::result::Result<T, CoreError>;

/// Errors that can occur while extracting or querying calendar events.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    /// The ICS text could not be parsed into calendar components.
    #[error("ics parse error: {0}")]
    Parse(String),

    /// A TZID that is not in the timezone table.
    #[error("unknown timezone: {0}")]
    UnknownTimezone(String),

    /// A required property is absent from an event.
    #[error("missing property {property} on event {uid}")]
    MissingProperty { uid: String, property: &'static str },

    /// DTSTART and DTEND disagree on date vs date-time.
    #[error("start and end of event {uid} are not the same kind of timestamp")]
    TimeKindMismatch { uid: String },

    /// A DTSTART/DTEND/DURATION value that does not parse.
    #[error("invalid timestamp: {0}")]
    InvalidTimestamp(String),

    /// A range bound supplied by the caller that does not parse.
    #[error("invalid range bound: {0}")]
    InvalidBound(String),
}

impl CoreError {
    /// Whether this error aborts a whole calendar load.
    ///
    /// Per-event problems (missing fields, mismatched kinds, bad values) are
    /// not fatal: the event is skipped and extraction continues.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::Parse(_) | Self::UnknownTimezone(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fatal_classification() {
        assert!(CoreError::Parse("eof".into()).is_fatal());
        assert!(CoreError::UnknownTimezone("Mars/Olympus".into()).is_fatal());
        assert!(
            !CoreError::MissingProperty {
                uid: "a".into(),
                property: "DTEND"
            }
            .is_fatal()
        );
        assert!(!CoreError::TimeKindMismatch { uid: "a".into() }.is_fatal());
    }
}
