//! Eval command implementation

use std::path::Path;

use anylint_core::Context;
use anylint_expr::{EvalRequest, EvaluationChannel, Evaluator, Scope, Value};
use miette::{IntoDiagnostic, Result};

use super::{build_context, runtime};
use crate::cli::DocumentArgs;

/// Evaluates `expression` on the isolated worker and prints the JSON result.
pub fn run_eval(expression: &str, document: Option<&Path>, raw: Option<&str>) -> Result<()> {
    let context = match document {
        Some(path) => build_context(&DocumentArgs {
            document: path.to_path_buf(),
            language: None,
            line: 1,
        })?,
        None => Context::default(),
    };
    let raw = match raw {
        Some(json) => {
            let value: serde_json::Value = serde_json::from_str(json).into_diagnostic()?;
            Value::from(value)
        }
        None => Value::Undefined,
    };
    let scope = Scope::action(context.to_value(), raw);

    let channel = EvaluationChannel::open().into_diagnostic()?;
    let result = runtime()?.block_on(channel.evaluate(EvalRequest::new(expression, scope)));
    channel.shutdown();

    let value = result.into_diagnostic()?;
    println!(
        "{}",
        serde_json::to_string_pretty(&value.to_json()).into_diagnostic()?
    );
    Ok(())
}
