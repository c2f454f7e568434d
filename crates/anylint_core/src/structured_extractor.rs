//! Extraction from JSON and YAML tool output through selector expressions.

use anylint_expr::{EvalRequest, Evaluator, Scope, Value};
use anylint_text::LineSource;
use futures_util::future::join_all;
use tracing::{debug, trace};

use crate::LinterError;
use crate::config::{DiagnosticSpec, Selectors};
use crate::diagnostic::{DiagnosticRecord, ReportedRange};

/// Document formats read through selectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StructuredFormat {
    Json,
    Yaml,
}

/// Parses tool output into an expression value.
///
/// Blank output is a clean run and parses to `null`.
pub fn parse_document(output: &str, format: StructuredFormat) -> Result<Value, LinterError> {
    if output.trim().is_empty() {
        return Ok(Value::Null);
    }
    let json: serde_json::Value = match format {
        StructuredFormat::Json => serde_json::from_str(output)
            .map_err(|e| LinterError::parse(format!("Invalid JSON output: {}", e)))?,
        StructuredFormat::Yaml => serde_yaml::from_str(output)
            .map_err(|e| LinterError::parse(format!("Invalid YAML output: {}", e)))?,
    };
    Ok(Value::from(json))
}

/// Evaluates selectors against a parsed document.
pub struct StructuredExtractor<'a> {
    selectors: &'a Selectors,
    spec: &'a DiagnosticSpec,
    source: &'a str,
    document: &'a dyn LineSource,
    evaluator: &'a dyn Evaluator,
}

impl<'a> StructuredExtractor<'a> {
    /// Creates an extractor.
    ///
    /// # Arguments
    ///
    /// * `selectors` - Selector expressions
    /// * `spec` - Coordinate and severity policy
    /// * `source` - Linter name stored on each record
    /// * `document` - Text of the linted document
    /// * `evaluator` - Runs the selectors
    pub fn new(
        selectors: &'a Selectors,
        spec: &'a DiagnosticSpec,
        source: &'a str,
        document: &'a dyn LineSource,
        evaluator: &'a dyn Evaluator,
    ) -> Self {
        Self {
            selectors,
            spec,
            source,
            document,
            evaluator,
        }
    }

    /// Extracts the diagnostics of `root`, in document order.
    ///
    /// When the `diagnostics` selector fails or does not yield an array the
    /// result is empty. Entries without a file, and diagnostics whose start
    /// position is not numeric, are skipped.
    pub async fn extract(&self, root: &Value) -> Vec<DiagnosticRecord> {
        let Some(value) = self.select(&self.selectors.diagnostics, root).await else {
            return Vec::new();
        };
        let Value::Array(entries) = value else {
            debug!(
                "Selector '{}' produced {} instead of an array",
                self.selectors.diagnostics,
                value.type_name()
            );
            return Vec::new();
        };

        join_all(entries.iter().map(|entry| self.extract_entry(entry)))
            .await
            .into_iter()
            .flatten()
            .collect()
    }

    async fn extract_entry(&self, entry: &Value) -> Vec<DiagnosticRecord> {
        let Some(file) = self.file_of(entry).await else {
            trace!("Skipping entry without a file");
            return Vec::new();
        };

        let Some(sub_selector) = &self.selectors.sub_diagnostics else {
            return self.extract_diagnostic(entry, &file).await.into_iter().collect();
        };
        match self.select(sub_selector, entry).await {
            Some(Value::Array(subs)) => {
                join_all(subs.iter().map(|sub| self.extract_diagnostic(sub, &file)))
                    .await
                    .into_iter()
                    .flatten()
                    .collect()
            }
            Some(other) => {
                debug!(
                    "Selector '{}' produced {} instead of an array",
                    sub_selector,
                    other.type_name()
                );
                Vec::new()
            }
            None => Vec::new(),
        }
    }

    async fn extract_diagnostic(&self, item: &Value, parent_file: &str) -> Option<DiagnosticRecord> {
        let file = self
            .file_of(item)
            .await
            .unwrap_or_else(|| parent_file.to_string());

        let start_line = self.number(&self.selectors.start_line, item).await;
        let start_column = self.number(&self.selectors.start_column, item).await;
        let (Some(start_line), Some(start_column)) = (start_line, start_column) else {
            trace!("Skipping diagnostic in '{}' without a numeric start", file);
            return None;
        };
        let reported = ReportedRange {
            start_line,
            start_column: Some(start_column),
            end_line: self.optional_number(self.selectors.end_line.as_deref(), item).await,
            end_column: self.optional_number(self.selectors.end_column.as_deref(), item).await,
        };

        let message = match &self.selectors.message {
            Some(selector) => self.select(selector, item).await.map(text).unwrap_or_default(),
            None => String::new(),
        };
        let severity = match &self.selectors.severity {
            Some(selector) => self.select(selector, item).await.map(text),
            None => None,
        };

        Some(DiagnosticRecord {
            file,
            range: reported.normalize(&self.spec.coordinates, self.document),
            message,
            severity: self.spec.severity_for(severity.as_deref()),
            source: self.source.to_string(),
            raw: item.clone(),
        })
    }

    async fn file_of(&self, item: &Value) -> Option<String> {
        self.select(&self.selectors.file, item)
            .await
            .filter(Value::is_truthy)
            .map(text)
    }

    async fn number(&self, selector: &str, item: &Value) -> Option<i64> {
        let value = self.select(selector, item).await?;
        let number = value.as_i64();
        if number.is_none() {
            trace!(
                "Selector '{}' produced {} instead of a number",
                selector,
                value.type_name()
            );
        }
        number
    }

    /// Non-numeric results count as absent.
    async fn optional_number(&self, selector: Option<&str>, item: &Value) -> Option<i64> {
        match selector {
            Some(selector) => self.number(selector, item).await,
            None => None,
        }
    }

    async fn select(&self, selector: &str, subject: &Value) -> Option<Value> {
        let request = EvalRequest::new(selector, Scope::selector(subject.clone()));
        match self.evaluator.evaluate(request).await {
            Ok(value) => Some(value),
            Err(e) => {
                trace!("Selector '{}' failed: {}", selector, e);
                None
            }
        }
    }
}

fn text(value: Value) -> String {
    match value {
        Value::String(s) => s,
        Value::Undefined | Value::Null => String::new(),
        other => other.to_display_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostic::{Position, Range, Severity};
    use anylint_expr::InlineEvaluator;
    use anylint_text::{CoordinateFlags, TextDocument};
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use serde_json::json;
    use std::collections::BTreeMap;

    fn selectors(value: serde_json::Value) -> Selectors {
        serde_json::from_value(value).unwrap()
    }

    async fn run(
        output: &str,
        format: StructuredFormat,
        selectors: &Selectors,
        spec: &DiagnosticSpec,
        doc: &str,
    ) -> Vec<DiagnosticRecord> {
        let root = parse_document(output, format).unwrap();
        let evaluator = InlineEvaluator::new();
        let document = TextDocument::new(doc);
        StructuredExtractor::new(selectors, spec, "tool", &document, &evaluator)
            .extract(&root)
            .await
    }

    fn basic() -> Selectors {
        selectors(json!({
            "diagnostics": "items",
            "file": "p",
            "startLine": "l",
            "startColumn": "c",
            "message": "m"
        }))
    }

    #[tokio::test]
    async fn test_json_items() {
        let records = run(
            r#"{"items":[{"p":"a.ts","l":3,"c":5,"m":"bad"}]}"#,
            StructuredFormat::Json,
            &basic(),
            &DiagnosticSpec::default(),
            "1\n2\nabcdefgh\n",
        )
        .await;
        assert_eq!(records.len(), 1);
        let record = &records[0];
        assert_eq!(record.file, "a.ts");
        assert_eq!(record.range.start, Position::new(2, 4));
        assert_eq!(record.range.end, Position::new(2, 8));
        assert_eq!(record.message, "bad");
        assert_eq!(record.raw.member("l").unwrap(), Value::Number(3.0));
    }

    #[tokio::test]
    async fn test_yaml_with_end_and_severity() {
        let output = "\
problems:
  - path: b.yml
    line: 0
    col: 0
    end_line: 0
    end_col: 2
    level: warn
    text: trailing spaces
";
        let spec = DiagnosticSpec {
            coordinates: CoordinateFlags::NORMALIZED,
            severity_map: BTreeMap::from([("warn".to_string(), Severity::Warning)]),
            ..Default::default()
        };
        let sel = selectors(json!({
            "diagnostics": "problems",
            "file": "path",
            "startLine": "line",
            "startColumn": "col",
            "endLine": "end_line",
            "endColumn": "end_col",
            "severity": "level",
            "message": "text"
        }));
        let records = run(output, StructuredFormat::Yaml, &sel, &spec, "key: v  \n").await;
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].severity, Severity::Warning);
        assert_eq!(
            records[0].range,
            Range::new(Position::new(0, 0), Position::new(0, 2))
        );
        assert_eq!(records[0].message, "trailing spaces");
    }

    #[tokio::test]
    async fn test_sub_diagnostics_inherit_parent_file() {
        let output = json!({
            "files": [
                {
                    "filePath": "/w/a.js",
                    "messages": [
                        { "line": 1, "column": 1, "message": "one" },
                        { "line": 2, "column": 1, "message": "two", "file": "/w/b.js" }
                    ]
                },
                { "messages": [ { "line": 1, "column": 1, "message": "orphan" } ] }
            ]
        })
        .to_string();
        let sel = selectors(json!({
            "diagnostics": "files",
            "file": "$.file ?? $.filePath",
            "subDiagnostics": "messages",
            "startLine": "line",
            "startColumn": "column",
            "message": "message"
        }));
        let records = run(
            &output,
            StructuredFormat::Json,
            &sel,
            &DiagnosticSpec::default(),
            "x\ny\n",
        )
        .await;
        let got: Vec<(&str, &str)> = records
            .iter()
            .map(|r| (r.file.as_str(), r.message.as_str()))
            .collect();
        assert_eq!(got, vec![("/w/a.js", "one"), ("/w/b.js", "two")]);
    }

    #[rstest]
    #[case::not_an_array(r#"{"items": {"p": "a"}}"#)]
    #[case::missing_key(r#"{"other": []}"#)]
    #[case::root_array(r#"[1, 2]"#)]
    #[case::blank("  \n")]
    #[tokio::test]
    async fn test_diagnostics_selector_without_array(#[case] output: &str) {
        let records = run(
            output,
            StructuredFormat::Json,
            &basic(),
            &DiagnosticSpec::default(),
            "",
        )
        .await;
        assert!(records.is_empty());
    }

    #[tokio::test]
    async fn test_bad_entries_are_skipped() {
        let output = json!({ "items": [
            { "p": "", "l": 1, "c": 1 },
            { "p": "a", "l": "one", "c": 1 },
            { "p": "b", "l": 1 },
            { "p": "c", "l": 1, "c": 1, "m": null },
            "not an object"
        ]})
        .to_string();
        let records = run(
            &output,
            StructuredFormat::Json,
            &basic(),
            &DiagnosticSpec::default(),
            "abc",
        )
        .await;
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].file, "c");
        assert_eq!(records[0].message, "");
    }

    #[tokio::test]
    async fn test_non_numeric_end_is_defaulted() {
        let output = r#"{"items":[{"p":"a","l":1,"c":2,"el":"x","ec":null,"m":"m"}]}"#;
        let sel = selectors(json!({
            "diagnostics": "items",
            "file": "p",
            "startLine": "l",
            "startColumn": "c",
            "endLine": "el",
            "endColumn": "ec"
        }));
        let records = run(
            output,
            StructuredFormat::Json,
            &sel,
            &DiagnosticSpec::default(),
            "hello",
        )
        .await;
        assert_eq!(
            records[0].range,
            Range::new(Position::new(0, 1), Position::new(0, 5))
        );
    }

    #[tokio::test]
    async fn test_selectors_are_expressions() {
        let output = json!({ "report": { "results": [
            { "loc": { "path": "src/x.py", "start": [4, 2] }, "code": "E1", "text": "oops" }
        ]}})
        .to_string();
        let sel = selectors(json!({
            "diagnostics": "report.results",
            "file": "loc.path",
            "startLine": "loc.start[0]",
            "startColumn": "loc.start[1]",
            "message": "'[' + code + '] ' + text"
        }));
        let records = run(
            &output,
            StructuredFormat::Json,
            &sel,
            &DiagnosticSpec::default(),
            "1\n2\n3\n4444\n",
        )
        .await;
        assert_eq!(records[0].message, "[E1] oops");
        assert_eq!(records[0].range.start, Position::new(3, 1));
    }

    #[rstest]
    #[case(StructuredFormat::Json, "{ not json")]
    #[case(StructuredFormat::Yaml, "a: [1, 2")]
    fn test_parse_errors(#[case] format: StructuredFormat, #[case] output: &str) {
        let err = parse_document(output, format).unwrap_err();
        assert!(matches!(err, LinterError::Parse(_)));
    }
}
