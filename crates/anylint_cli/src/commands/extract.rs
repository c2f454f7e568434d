//! Extract command implementation

use std::io::ErrorKind;
use std::path::Path;
use std::sync::Arc;

use anylint_core::{DiagnosticSet, Event, plan_lint_pass};
use anylint_expr::{EvaluationChannel, Evaluator, InlineEvaluator};
use anylint_text::TextDocument;
use miette::{IntoDiagnostic, Result};
use tracing::{info, warn};

use super::{build_context, load_config, runtime};
use crate::cli::DocumentArgs;
use crate::output::{Report, output_reports};

pub fn run_extract(
    config_path: Option<&Path>,
    linter_name: &str,
    document: &DocumentArgs,
    input: Option<&Path>,
    format: &str,
    event: Event,
    isolated: bool,
) -> Result<bool> {
    let config = load_config(config_path)?;
    if config.linter(linter_name).is_none() {
        return Err(miette::miette!(
            "Linter '{}' is not configured",
            linter_name
        ));
    }

    let context = build_context(document)?;
    let text = match std::fs::read_to_string(&context.file) {
        Ok(text) => text,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            warn!("Document {} does not exist, columns are not converted", context.file);
            String::new()
        }
        Err(e) => return Err(e).into_diagnostic(),
    };
    let document = TextDocument::new(&text);
    let output = read_input(input)?;

    let evaluator: Box<dyn Evaluator> = if isolated {
        Box::new(EvaluationChannel::open().into_diagnostic()?)
    } else {
        Box::new(InlineEvaluator::new())
    };

    runtime()?.block_on(async {
        let plan = plan_lint_pass(&config, &context, event, evaluator.as_ref()).await;
        let Some(invocation) = plan.into_iter().find(|i| i.name == linter_name) else {
            info!("Linter '{}' does not run on '{}'", linter_name, event);
            return Ok(false);
        };

        let set = DiagnosticSet::extract(
            &output,
            &invocation.name,
            Arc::new(invocation.spec),
            Arc::new(context),
            &document,
            evaluator.as_ref(),
        )
        .await;

        let mut reports = Vec::with_capacity(set.len());
        for (path, records) in set.group_by_file(Path::new(&invocation.cwd), |p| p.exists()) {
            for record in records {
                let actions = set
                    .actions_for(record, &document, document.eol(), evaluator.as_ref())
                    .await;
                reports.push(Report {
                    path: path.clone(),
                    record,
                    actions,
                });
            }
        }

        output_reports(&reports, format)?;
        Ok::<bool, miette::Report>(set.has_errors())
    })
}

fn read_input(input: Option<&Path>) -> Result<String> {
    match input {
        Some(path) => std::fs::read_to_string(path).into_diagnostic(),
        None => std::io::read_to_string(std::io::stdin()).into_diagnostic(),
    }
}
