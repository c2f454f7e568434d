//! Extraction from line-oriented tool output.

use std::collections::BTreeMap;

use anylint_expr::Value;
use anylint_text::{LineSource, split_output_lines};
use tracing::trace;

use crate::config::DiagnosticSpec;
use crate::diagnostic::{DiagnosticRecord, ReportedRange};
use crate::format::DiagnosticTemplate;

/// Extracts one diagnostic per matching output line.
///
/// Lines that do not match, lack `file` or `startLine`, or carry a number
/// that does not fit are skipped. Every captured group is kept in the
/// record's raw data.
///
/// # Arguments
///
/// * `output` - Raw text of the configured output stream
/// * `template` - Compiled line template
/// * `spec` - Coordinate and severity policy
/// * `source` - Linter name stored on each record
/// * `document` - Text of the linted document
pub fn extract_lines(
    output: &str,
    template: &DiagnosticTemplate,
    spec: &DiagnosticSpec,
    source: &str,
    document: &dyn LineSource,
) -> Vec<DiagnosticRecord> {
    split_output_lines(output)
        .iter()
        .enumerate()
        .filter_map(|(index, line)| {
            let record = extract_line(line, template, spec, source, document);
            if record.is_none() {
                trace!("Output line {} produced no diagnostic: {}", index + 1, line);
            }
            record
        })
        .collect()
}

fn extract_line(
    line: &str,
    template: &DiagnosticTemplate,
    spec: &DiagnosticSpec,
    source: &str,
    document: &dyn LineSource,
) -> Option<DiagnosticRecord> {
    let captures = template.captures(line)?;

    let file = captures.get("file").filter(|f| !f.is_empty())?.clone();
    let reported = ReportedRange {
        start_line: number(&captures, "startLine")??,
        start_column: number(&captures, "startColumn")?,
        end_line: number(&captures, "endLine")?,
        end_column: number(&captures, "endColumn")?,
    };
    let range = reported.normalize(&spec.coordinates, document);
    let severity = spec.severity_for(captures.get("severity").map(String::as_str));
    let message = captures.get("message").cloned().unwrap_or_default();

    let raw: BTreeMap<String, Value> = captures
        .into_iter()
        .map(|(name, value)| (name, Value::String(value)))
        .collect();

    Some(DiagnosticRecord {
        file,
        range,
        message,
        severity,
        source: source.to_string(),
        raw: Value::Object(raw),
    })
}

/// Reads an optional numeric group.
///
/// The outer `None` rejects the line (the group is present but does not
/// parse); the inner `None` means the group is absent or empty.
fn number(captures: &BTreeMap<String, String>, name: &str) -> Option<Option<i64>> {
    match captures.get(name).map(String::as_str) {
        None | Some("") => Some(None),
        Some(text) => text.parse().ok().map(Some),
    }
}
