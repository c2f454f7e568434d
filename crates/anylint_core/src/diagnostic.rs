//! Diagnostic records and their coordinates.

use std::fmt;
use std::str::FromStr;

use anylint_expr::Value;
use anylint_text::{CoordinateFlags, LineSource};
use serde::{Deserialize, Serialize, Serializer};

/// Severity level for diagnostics.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Error - must be fixed.
    #[default]
    Error,
    /// Warning - should be reviewed.
    Warning,
    /// Info - informational message.
    Info,
    /// Hint - a suggestion.
    Hint,
}

impl Severity {
    /// All levels, most severe first.
    pub const ALL: [Severity; 4] = [
        Severity::Error,
        Severity::Warning,
        Severity::Info,
        Severity::Hint,
    ];

    /// Lowercase name as used in configuration.
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Info => "info",
            Severity::Hint => "hint",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Severity::ALL
            .into_iter()
            .find(|level| level.as_str() == s)
            .ok_or_else(|| format!("unknown severity '{}'", s))
    }
}

/// A zero-based line and character column.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct Position {
    /// Zero-based line.
    pub line: u32,
    /// Zero-based character column.
    pub column: u32,
}

impl Position {
    /// Creates a position.
    pub fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }
}

/// A start/end pair with `end >= start`.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct Range {
    /// Inclusive start.
    pub start: Position,
    /// Exclusive end.
    pub end: Position,
}

impl Range {
    /// Creates a range. An end before the start is clamped to the start.
    pub fn new(start: Position, end: Position) -> Self {
        Self {
            start,
            end: end.max(start),
        }
    }
}

/// Coordinates as a tool reported them, before normalization.
///
/// Only the start line is mandatory; everything else defaults against the
/// text of the referenced line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReportedRange {
    /// Reported start line.
    pub start_line: i64,
    /// Reported start column, `None` means column 0.
    pub start_column: Option<i64>,
    /// Reported end line, `None` means the start line.
    pub end_line: Option<i64>,
    /// Reported end column, `None` means the end of the end line.
    pub end_column: Option<i64>,
}

impl ReportedRange {
    /// Converts to the internal convention.
    ///
    /// Byte columns are converted against the text of their own line, so the
    /// originating document must be available. Lines outside the document
    /// read as empty text.
    pub fn normalize(&self, flags: &CoordinateFlags, lines: &dyn LineSource) -> Range {
        let start_line = flags.line(self.start_line);
        let start_column = self
            .start_column
            .map(|c| flags.start_column(c, lines.line_text_or_empty(start_line)))
            .unwrap_or(0);
        let end_line = self.end_line.map(|l| flags.line(l)).unwrap_or(start_line);
        let end_text = lines.line_text_or_empty(end_line);
        let end_column = match self.end_column {
            Some(c) => flags.end_column(c, end_text),
            None => CoordinateFlags::end_of_line(end_text),
        };
        Range::new(
            Position::new(start_line, start_column),
            Position::new(end_line, end_column),
        )
    }
}

/// A normalized, positioned finding extracted from tool output.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagnosticRecord {
    /// File as reported by the tool (possibly relative).
    pub file: String,
    /// Normalized range.
    pub range: Range,
    /// Message text.
    pub message: String,
    /// Resolved severity.
    pub severity: Severity,
    /// Name of the linter that produced it.
    pub source: String,
    /// Everything captured for this record: named groups for line templates,
    /// the selected entry for structured output.
    #[serde(rename = "rawCaptured", serialize_with = "serialize_raw")]
    pub raw: Value,
}

fn serialize_raw<S: Serializer>(raw: &Value, serializer: S) -> Result<S::Ok, S::Error> {
    raw.to_json().serialize(serializer)
}
