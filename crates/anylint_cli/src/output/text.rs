//! Text output formatter

use anylint_core::Severity;

use super::Report;

pub fn output_text(reports: &[Report<'_>]) {
    for report in reports {
        let diag = report.record;
        println!(
            "{}:{}:{} {} [{}]: {}",
            report.path.display(),
            diag.range.start.line + 1,
            diag.range.start.column + 1,
            diag.severity,
            diag.source,
            diag.message
        );
        for action in &report.actions {
            println!("  action: {}", action.title());
        }
    }

    let errors = reports
        .iter()
        .filter(|r| r.record.severity == Severity::Error)
        .count();
    println!(
        "Found {} diagnostics ({} errors)",
        reports.len(),
        errors
    );
}
