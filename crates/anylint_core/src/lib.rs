//! # anylint_core
//!
//! Diagnostic extraction engine for AnyLint.
//!
//! This crate provides:
//! - Configuration loading (`.anylint.jsonc`) and resolution into a
//!   [`DiagnosticSpec`]
//! - Line-template compilation and line-by-line extraction
//! - Selector-based extraction from JSON and YAML output
//! - Lint-pass planning, context substitution and follow-up actions
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use anylint_core::{Context, DiagnosticSet, LinterConfig};
//! use anylint_expr::InlineEvaluator;
//! use anylint_text::TextDocument;
//!
//! let config = LinterConfig::from_file(".anylint.jsonc")?;
//! let spec = Arc::new(config.linter("tsc").unwrap().spec()?);
//! let document = TextDocument::new(&std::fs::read_to_string("src/main.ts")?);
//!
//! let set = DiagnosticSet::extract(
//!     &tool_output,
//!     "tsc",
//!     spec,
//!     Arc::new(context),
//!     &document,
//!     &InlineEvaluator::new(),
//! )
//! .await;
//! for record in &set.diagnostics {
//!     println!("{}:{} {}", record.file, record.range.start.line + 1, record.message);
//! }
//! ```

mod action;
mod assembly;
mod config;
pub mod context;
mod diagnostic;
mod error;
pub mod format;
mod line_extractor;
mod linter;
pub mod resolver;
mod structured_extractor;

pub use action::{ActionConfig, ActionResolver, CommentLocation, ResolvedAction, TextEdit};
pub use assembly::DiagnosticSet;
pub use config::{
    DiagnosticConfig, DiagnosticSpec, DiagnosticType, ExtractionMode, LinterConfig,
    LinterDefinition, OutputStream, Selectors, default_severity_map,
};
pub use context::{Context, ContextInput};
pub use diagnostic::{DiagnosticRecord, Position, Range, ReportedRange, Severity};
pub use error::LinterError;
pub use format::{DEFAULT_FORMAT, DiagnosticTemplate};
pub use line_extractor::extract_lines;
pub use linter::{Event, Invocation, plan_lint_pass};
pub use resolver::resolve_reported_path;
pub use structured_extractor::{StructuredExtractor, StructuredFormat, parse_document};
