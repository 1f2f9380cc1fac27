//! Category classification from free-text event titles.
//!
//! Titles follow a naming convention where leading `segment:` tokens name a
//! category hierarchy:
//!
//! - `work:project: standup` → `[["work", "project"]]`
//! - `mixed: work: study: reading` → `[["work"], ["study"]]`, mixed
//! - `(desc.) gym: legs` → `[["gym"]]`, described
//!
//! Colon-joined segments without whitespace form one path; whitespace
//! separates independent paths.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Leading marker for events whose duration is split across categories.
const MIXED_MARKER: &str = "mixed:";
/// Marker for events carrying an extended description.
const DESCRIBED_MARKER: &str = "(desc.)";
/// Titles containing this word are forced under the `sleep` top level.
const SLEEP: &str = "sleep";

/// An ordered list of hierarchy levels, top level first.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CategoryPath(Vec<String>);

impl CategoryPath {
    /// Create a path from its levels.
    #[must_use]
    pub fn new(levels: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self(levels.into_iter().map(Into::into).collect())
    }

    /// The label at `depth`, or `""` when the path is shallower.
    #[must_use]
    pub fn level(&self, depth: usize) -> &str {
        self.0.get(depth).map_or("", String::as_str)
    }

    /// Number of levels.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the path has no levels.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// All levels, top level first.
    #[must_use]
    pub fn levels(&self) -> &[String] {
        &self.0
    }
}

impl fmt::Display for CategoryPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join(":"))
    }
}

/// Result of classifying a title.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Classification {
    /// Category paths in title order. Empty for uncategorized titles.
    pub categories: Vec<CategoryPath>,
    /// Duration is split evenly across the categories.
    pub mixed: bool,
    /// Title carried the `(desc.)` marker.
    pub described: bool,
}

/// Classify an event title.
#[must_use]
pub fn classify(title: &str) -> Classification {
    let lowered = title.to_lowercase();
    let mut text = lowered.trim();

    let mixed = match text.strip_prefix(MIXED_MARKER) {
        Some(rest) => {
            text = rest.trim_start();
            true
        }
        None => false,
    };

    let described = text.contains(DESCRIBED_MARKER);
    let text = strip_parenthesized(text);
    let text = text.trim();

    let mut categories = parse_paths(text);

    if text.contains(SLEEP) {
        for path in &mut categories {
            if let Some(top) = path.0.first_mut() {
                SLEEP.clone_into(top);
            }
        }
    }

    Classification {
        categories,
        mixed,
        described,
    }
}

/// Remove every `(...)` group along with the whitespace that follows it.
///
/// An unclosed `(` is kept as-is.
fn strip_parenthesized(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(open) = rest.find('(') {
        let Some(close) = rest[open..].find(')') else {
            break;
        };
        out.push_str(&rest[..open]);
        rest = rest[open + close + 1..].trim_start();
    }
    out.push_str(rest);
    out
}

/// Tokenize leading category paths.
///
/// Scanning stops at the first word contributing no segment, and right
/// after a word that has free text following its last colon.
fn parse_paths(text: &str) -> Vec<CategoryPath> {
    let mut paths = Vec::new();

    for word in text.split_whitespace() {
        let (segments, complete) = parse_word(word);
        if segments.is_empty() {
            break;
        }
        paths.push(CategoryPath::new(segments));
        if !complete {
            break;
        }
    }

    paths
}

/// Split a word into its leading colon-terminated segments.
///
/// Returns the segments and whether the whole word was consumed.
fn parse_word(word: &str) -> (Vec<&str>, bool) {
    let mut segments = Vec::new();
    let mut rest = word;

    while let Some(colon) = rest.find(':') {
        let segment = &rest[..colon];
        if !is_segment(segment) {
            return (segments, false);
        }
        segments.push(segment);
        rest = &rest[colon + 1..];
    }

    (segments, rest.is_empty())
}

fn is_segment(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_alphanumeric() || c == '_' || c == '-')
}
