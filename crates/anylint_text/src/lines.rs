//! Line splitting and read access to document lines.

/// Read access to the text of the document being linted.
///
/// Extractors need the text of a referenced line to convert byte columns and
/// to default a missing end column to the end of the line.
pub trait LineSource {
    /// Returns the text of a zero-based line, without its terminator.
    fn line_text(&self, line: u32) -> Option<&str>;

    /// Returns the text of a line, or an empty string when the line does not
    /// exist in the document.
    fn line_text_or_empty(&self, line: u32) -> &str {
        self.line_text(line).unwrap_or("")
    }
}

/// Replaces `\r\n` and lone `\r` terminators with `\n`.
pub fn normalize_line_endings(text: &str) -> String {
    text.replace("\r\n", "\n").replace('\r', "\n")
}

/// Splits raw tool output into physical lines.
///
/// Terminators are normalized first and trailing whitespace of the whole
/// output is dropped, so a final newline does not produce an empty line.
pub fn split_output_lines(output: &str) -> Vec<String> {
    let normalized = normalize_line_endings(output);
    let trimmed = normalized.trim_end();
    if trimmed.is_empty() {
        return Vec::new();
    }
    trimmed.split('\n').map(str::to_string).collect()
}

/// An in-memory document snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TextDocument {
    lines: Vec<String>,
    eol: &'static str,
}

impl TextDocument {
    /// Creates a document from its full text.
    ///
    /// The end-of-line sequence is `\r\n` when the first terminator in the
    /// text is `\r\n`, otherwise `\n`.
    pub fn new(content: &str) -> Self {
        let eol = match content.find('\n') {
            Some(index) if index > 0 && content.as_bytes()[index - 1] == b'\r' => "\r\n",
            _ => "\n",
        };
        let lines = normalize_line_endings(content)
            .split('\n')
            .map(str::to_string)
            .collect();
        Self { lines, eol }
    }

    /// The end-of-line sequence used by the document.
    pub fn eol(&self) -> &'static str {
        self.eol
    }

    /// Number of lines. An empty document has one empty line.
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }
}

impl LineSource for TextDocument {
    fn line_text(&self, line: u32) -> Option<&str> {
        self.lines.get(line as usize).map(String::as_str)
    }
}
