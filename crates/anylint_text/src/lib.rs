//! # anylint_text
//!
//! Text helpers shared by the AnyLint extractors.
//!
//! - [`byte_to_char_offset`] maps a byte column reported by a tool to a
//!   character column.
//! - [`CoordinateFlags`] describes how a tool numbers lines and columns and
//!   normalizes them to zero-based character positions.
//! - [`LineSource`] gives extractors read access to the text of the linted
//!   document, which is needed to convert and default columns.

mod coordinates;
mod lines;

pub use coordinates::{CoordinateFlags, byte_to_char_offset};
pub use lines::{LineSource, TextDocument, normalize_line_endings, split_output_lines};
