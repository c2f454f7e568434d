//! Turning one tool run into the diagnostic set published for its linter.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anylint_expr::Evaluator;
use anylint_text::LineSource;
use tracing::{info, warn};

use crate::action::{ActionResolver, ResolvedAction};
use crate::config::{DiagnosticSpec, ExtractionMode, Selectors};
use crate::context::Context;
use crate::diagnostic::{DiagnosticRecord, Severity};
use crate::line_extractor::extract_lines;
use crate::resolver::resolve_reported_path;
use crate::structured_extractor::{StructuredExtractor, StructuredFormat, parse_document};

/// Every diagnostic one linter produced in one pass.
///
/// Replaces the previous set for the same source wholesale.
#[derive(Debug, Clone)]
pub struct DiagnosticSet {
    /// Linter name.
    pub source: String,
    /// Configuration the records were extracted with.
    pub spec: Arc<DiagnosticSpec>,
    /// Context of the pass, used again when resolving actions.
    pub context: Arc<Context>,
    /// Records in output order.
    pub diagnostics: Vec<DiagnosticRecord>,
}

impl DiagnosticSet {
    /// Extracts the diagnostics of one tool run.
    ///
    /// Unparsable structured output is logged and yields an empty set.
    pub async fn extract(
        output: &str,
        source: &str,
        spec: Arc<DiagnosticSpec>,
        context: Arc<Context>,
        document: &dyn LineSource,
        evaluator: &dyn Evaluator,
    ) -> Self {
        let diagnostics = match &spec.mode {
            ExtractionMode::Lines { template } => {
                extract_lines(output, template, &spec, source, document)
            }
            ExtractionMode::Json { selectors } => {
                let format = StructuredFormat::Json;
                extract_structured(output, format, selectors, &spec, source, document, evaluator)
                    .await
            }
            ExtractionMode::Yaml { selectors } => {
                let format = StructuredFormat::Yaml;
                extract_structured(output, format, selectors, &spec, source, document, evaluator)
                    .await
            }
        };
        info!("Linter '{}' reported {} diagnostics", source, diagnostics.len());
        Self {
            source: source.to_string(),
            spec,
            context,
            diagnostics,
        }
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }

    /// Whether the pass found nothing.
    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    /// Whether any record has error severity.
    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.severity == Severity::Error)
    }

    /// Groups the records by resolved file path, keeping output order within
    /// each file.
    ///
    /// # Arguments
    ///
    /// * `cwd` - Working directory the linter ran in
    /// * `exists` - Whether a candidate path exists
    pub fn group_by_file(
        &self,
        cwd: &Path,
        exists: impl Fn(&Path) -> bool,
    ) -> BTreeMap<PathBuf, Vec<&DiagnosticRecord>> {
        let mut grouped: BTreeMap<PathBuf, Vec<&DiagnosticRecord>> = BTreeMap::new();
        for record in &self.diagnostics {
            let path = resolve_reported_path(&record.file, cwd, &exists);
            grouped.entry(path).or_default().push(record);
        }
        grouped
    }

    /// Resolves the configured follow-up actions for one record.
    pub async fn actions_for(
        &self,
        record: &DiagnosticRecord,
        document: &dyn LineSource,
        eol: &str,
        evaluator: &dyn Evaluator,
    ) -> Vec<ResolvedAction> {
        if self.spec.actions.is_empty() {
            return Vec::new();
        }
        ActionResolver::new(evaluator, &self.context, document, eol)
            .resolve(&self.spec.actions, record)
            .await
    }
}

async fn extract_structured(
    output: &str,
    format: StructuredFormat,
    selectors: &Selectors,
    spec: &DiagnosticSpec,
    source: &str,
    document: &dyn LineSource,
    evaluator: &dyn Evaluator,
) -> Vec<DiagnosticRecord> {
    match parse_document(output, format) {
        Ok(root) => {
            StructuredExtractor::new(selectors, spec, source, document, evaluator)
                .extract(&root)
                .await
        }
        Err(e) => {
            warn!("Linter '{}' output ignored: {}", source, e);
            Vec::new()
        }
    }
}
