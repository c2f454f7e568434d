//! Compilation of `${name}` line templates into matchers.

use std::collections::BTreeMap;

use regex::Regex;
use tracing::warn;

/// The template used when a linter configures none.
pub const DEFAULT_FORMAT: &str = "${file}:${startLine}:${startColumn}: ${message}";

const NUMERIC_KEYS: &[&str] = &["startLine", "startColumn", "endLine", "endColumn"];

/// What a placeholder is allowed to match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaceholderKind {
    /// Digits only (line and column keys).
    Numeric,
    /// Any text.
    Text,
}

impl PlaceholderKind {
    fn of(name: &str) -> Self {
        if NUMERIC_KEYS.contains(&name) {
            Self::Numeric
        } else {
            Self::Text
        }
    }

    fn pattern(&self) -> &'static str {
        match self {
            Self::Numeric => r"\d+",
            Self::Text => ".*",
        }
    }
}

/// One piece of a parsed template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Text matched verbatim.
    Literal(String),
    /// A named capture.
    Placeholder {
        /// Logical name, e.g. `file`.
        name: String,
        /// Allowed content.
        kind: PlaceholderKind,
    },
}

/// A compiled line template.
///
/// Every placeholder occurrence becomes its own regex group `p{index}`, so a
/// name may appear more than once. [`captures`](Self::captures) merges the
/// groups back under their logical names.
#[derive(Debug, Clone)]
pub struct DiagnosticTemplate {
    source: String,
    segments: Vec<Segment>,
    group_names: Vec<String>,
    regex: Option<Regex>,
}

impl DiagnosticTemplate {
    /// Compiles a template.
    ///
    /// Never fails: malformed placeholders are taken literally, and a pattern
    /// the regex engine rejects yields a template that matches nothing.
    pub fn compile(template: &str) -> Self {
        let segments = scan(template);
        let mut pattern = String::new();
        let mut group_names = Vec::new();
        for segment in &segments {
            match segment {
                Segment::Literal(text) => pattern.push_str(&regex::escape(text)),
                Segment::Placeholder { name, kind } => {
                    pattern.push_str(&format!("(?P<p{}>{})", group_names.len(), kind.pattern()));
                    group_names.push(name.clone());
                }
            }
        }
        let regex = match Regex::new(&pattern) {
            Ok(regex) => Some(regex),
            Err(e) => {
                warn!("Template '{}' cannot be matched: {}", template, e);
                None
            }
        };
        Self {
            source: template.to_string(),
            segments,
            group_names,
            regex,
        }
    }

    /// The template text this was compiled from.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Parsed segments in template order.
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Distinct placeholder names in order of first appearance.
    pub fn placeholder_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for name in &self.group_names {
            if !names.contains(&name.as_str()) {
                names.push(name);
            }
        }
        names
    }

    /// The generated regular expression, if compilation succeeded.
    pub fn pattern(&self) -> Option<&str> {
        self.regex.as_ref().map(Regex::as_str)
    }

    /// Matches a line and returns the captured values by logical name.
    ///
    /// When a name occurs more than once, the first group that participated
    /// with a non-empty value wins.
    pub fn captures(&self, line: &str) -> Option<BTreeMap<String, String>> {
        let caps = self.regex.as_ref()?.captures(line)?;
        let mut values: BTreeMap<String, String> = BTreeMap::new();
        for (index, name) in self.group_names.iter().enumerate() {
            let Some(m) = caps.name(&format!("p{}", index)) else {
                continue;
            };
            let slot = values.entry(name.clone()).or_default();
            if slot.is_empty() {
                *slot = m.as_str().to_string();
            }
        }
        Some(values)
    }
}

/// Splits a template into literals and `${identifier}` placeholders.
fn scan(template: &str) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut literal = String::new();
    let mut rest = template;
    while let Some(start) = rest.find("${") {
        literal.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        match placeholder_name(after) {
            Some(name) => {
                if !literal.is_empty() {
                    segments.push(Segment::Literal(std::mem::take(&mut literal)));
                }
                segments.push(Segment::Placeholder {
                    name: name.to_string(),
                    kind: PlaceholderKind::of(name),
                });
                rest = &after[name.len() + 1..];
            }
            None => {
                literal.push_str("${");
                rest = after;
            }
        }
    }
    literal.push_str(rest);
    if !literal.is_empty() {
        segments.push(Segment::Literal(literal));
    }
    segments
}

/// Reads `[A-Za-z_][A-Za-z0-9_]*` followed by `}`.
fn placeholder_name(text: &str) -> Option<&str> {
    let end = text.find('}')?;
    let name = &text[..end];
    let mut chars = name.chars();
    let first = chars.next()?;
    if (first.is_ascii_alphabetic() || first == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
    {
        Some(name)
    } else {
        None
    }
}
