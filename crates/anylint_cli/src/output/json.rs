//! JSON output formatter

use miette::{IntoDiagnostic, Result};

use super::Report;

pub fn output_json(reports: &[Report<'_>]) -> Result<()> {
    let output: Vec<_> = reports
        .iter()
        .map(|r| {
            serde_json::json!({
                "path": r.path.display().to_string(),
                "diagnostic": r.record,
                "actions": r.actions,
            })
        })
        .collect();
    println!(
        "{}",
        serde_json::to_string_pretty(&output).into_diagnostic()?
    );
    Ok(())
}
