//! Subcommand implementations

pub mod eval;
pub mod extract;
pub mod init;
pub mod plan;

use std::path::Path;

use anylint_core::{Context, ContextInput, LinterConfig};
use miette::{IntoDiagnostic, Result};
use tokio::runtime::Runtime;
use tracing::info;

use crate::cli::DocumentArgs;

/// Loads the configuration from `--config` or the current directory.
pub fn load_config(path: Option<&Path>) -> Result<LinterConfig> {
    if let Some(path) = path {
        return LinterConfig::from_file(path).into_diagnostic();
    }
    if let Some(path) = LinterConfig::discover(Path::new(".")) {
        info!("Using config: {}", path.display());
        return LinterConfig::from_file(&path).into_diagnostic();
    }

    info!("No config file found, using defaults");
    Ok(LinterConfig::new())
}

/// Builds the context for a document, with the current directory as the
/// only workspace folder.
pub fn build_context(args: &DocumentArgs) -> Result<Context> {
    let file = std::path::absolute(&args.document).into_diagnostic()?;
    let workspace = std::env::current_dir().into_diagnostic()?;
    let language_id = args.language.clone().unwrap_or_else(|| {
        file.extension()
            .map(|ext| ext.to_string_lossy().into_owned())
            .unwrap_or_default()
    });
    Ok(Context::new(ContextInput {
        workspace_folders: vec![workspace],
        file,
        selection_line: args.line.saturating_sub(1),
        selected_text: String::new(),
        language_id,
    }))
}

/// Runtime for driving the asynchronous core from a command.
pub fn runtime() -> Result<Runtime> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .into_diagnostic()
}
