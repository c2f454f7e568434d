//! Output formatting module

mod json;
mod text;

use std::path::PathBuf;

use anylint_core::{DiagnosticRecord, ResolvedAction};
use miette::Result;

/// One diagnostic ready to print.
pub struct Report<'a> {
    /// Resolved file path.
    pub path: PathBuf,
    pub record: &'a DiagnosticRecord,
    /// Follow-up actions offered for the record.
    pub actions: Vec<ResolvedAction>,
}

pub fn output_reports(reports: &[Report<'_>], format: &str) -> Result<()> {
    match format {
        "json" => json::output_json(reports)?,
        _ => text::output_text(reports),
    }
    Ok(())
}
