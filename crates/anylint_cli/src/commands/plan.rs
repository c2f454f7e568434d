//! Plan command implementation

use std::path::Path;

use anylint_core::{Event, plan_lint_pass};
use anylint_expr::InlineEvaluator;
use miette::{IntoDiagnostic, Result};

use super::{build_context, load_config, runtime};
use crate::cli::DocumentArgs;

pub fn run_plan(
    config_path: Option<&Path>,
    document: &DocumentArgs,
    event: Event,
    format: &str,
) -> Result<()> {
    let config = load_config(config_path)?;
    let context = build_context(document)?;
    let evaluator = InlineEvaluator::new();

    let invocations =
        runtime()?.block_on(plan_lint_pass(&config, &context, event, &evaluator));

    if format == "json" {
        println!(
            "{}",
            serde_json::to_string_pretty(&invocations).into_diagnostic()?
        );
        return Ok(());
    }

    for invocation in &invocations {
        let stdin = if invocation.pipe_stdin { " < document" } else { "" };
        println!(
            "{}: {} {}{} (cwd: {}, reads {:?})",
            invocation.name,
            invocation.bin_path,
            invocation.args.join(" "),
            stdin,
            invocation.cwd,
            invocation.output
        );
    }
    if event.debounce() > std::time::Duration::ZERO {
        println!("Debounce: {}ms", event.debounce().as_millis());
    }
    Ok(())
}
