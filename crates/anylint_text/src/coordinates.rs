//! Coordinate normalization.
//!
//! External tools disagree on how they number things: some report one-based
//! lines, some count columns in bytes, some point the end column at the last
//! character instead of one past it. Everything here converts towards the
//! internal convention: zero-based lines, zero-based character columns and an
//! exclusive end column.

use serde::{Deserialize, Serialize};

/// Converts a byte offset within `text` to a character offset.
///
/// Offsets that fall inside a multi-byte character resolve to that character.
/// Offsets at or past the end of the text resolve to the character length.
pub fn byte_to_char_offset(text: &str, byte_offset: usize) -> usize {
    let mut consumed = 0;
    for (index, ch) in text.chars().enumerate() {
        consumed += ch.len_utf8();
        if byte_offset < consumed {
            return index;
        }
    }
    text.chars().count()
}

/// How a tool numbers the positions it reports.
///
/// All flags default to `false`, which describes the most common tool
/// convention: one-based lines and columns, byte columns, exclusive end.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CoordinateFlags {
    /// Lines are reported starting at 0.
    pub line_zero_based: bool,
    /// Columns are reported starting at 0.
    pub column_zero_based: bool,
    /// Columns count characters rather than encoded bytes.
    pub column_character_based: bool,
    /// The end column points at the last character of the range.
    pub end_column_inclusive: bool,
}

impl CoordinateFlags {
    /// Flags that describe the internal convention. Normalizing with these is
    /// a no-op.
    pub const NORMALIZED: Self = Self {
        line_zero_based: true,
        column_zero_based: true,
        column_character_based: true,
        end_column_inclusive: false,
    };

    /// Normalizes a reported line number to a zero-based line index.
    pub fn line(&self, reported: i64) -> u32 {
        let line = if self.line_zero_based {
            reported
        } else {
            reported.saturating_sub(1)
        };
        clamp_index(line)
    }

    /// Normalizes a reported start column against the text of its line.
    pub fn start_column(&self, reported: i64, line_text: &str) -> u32 {
        let column = if self.column_zero_based {
            reported
        } else {
            reported.saturating_sub(1)
        };
        let column = clamp_index(column);
        if self.column_character_based {
            column
        } else {
            byte_to_char_offset(line_text, column as usize) as u32
        }
    }

    /// Normalizes a reported end column against the text of its line.
    ///
    /// Same adjustment as [`start_column`](Self::start_column), then moved one
    /// character right when the tool reports inclusive ends.
    pub fn end_column(&self, reported: i64, line_text: &str) -> u32 {
        let column = self.start_column(reported, line_text);
        if self.end_column_inclusive {
            column.saturating_add(1)
        } else {
            column
        }
    }

    /// The column used when a tool omits the end column: end of the line.
    pub fn end_of_line(line_text: &str) -> u32 {
        clamp_index(line_text.chars().count() as i64)
    }
}

fn clamp_index(value: i64) -> u32 {
    value.clamp(0, i64::from(u32::MAX)) as u32
}
