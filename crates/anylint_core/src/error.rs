//! Linter error types.

use thiserror::Error;

/// Errors that can occur while configuring or running a lint pass.
///
/// Per-record extraction problems never show up here; they are logged and
/// the record is skipped.
#[derive(Debug, Error)]
pub enum LinterError {
    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Tool output could not be parsed as the configured format.
    #[error("Parse error: {0}")]
    Parse(String),

    /// Expression evaluation error.
    #[error("Evaluation error: {0}")]
    Eval(#[from] anylint_expr::ExprError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl LinterError {
    /// Creates a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Creates a parse error.
    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse(message.into())
    }
}
