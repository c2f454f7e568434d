//! Follow-up actions offered for a diagnostic.
//!
//! Action descriptors hold expressions. They are evaluated per diagnostic
//! with `$` bound to the context and `$$` to the diagnostic's raw data.

use anylint_expr::{EvalRequest, Evaluator, Scope, Value};
use anylint_text::LineSource;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::context::Context;
use crate::diagnostic::{DiagnosticRecord, Position, Range};

/// Where an ignore comment is inserted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CommentLocation {
    /// Top of the file.
    StartFile,
    /// Own line above the diagnostic.
    #[default]
    PreviousLine,
    /// End of the diagnostic's line.
    CurrentLine,
    /// Own line below the diagnostic.
    NextLine,
}

/// An action descriptor as written in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ActionConfig {
    /// Opens a URI, e.g. the rule's documentation.
    OpenUri {
        title: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        condition: Option<String>,
        uri: String,
    },
    /// Inserts a suppression comment.
    Ignore {
        title: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        condition: Option<String>,
        comment: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        location: Option<CommentLocation>,
    },
    /// Runs a command, optionally linting again afterwards.
    Run {
        title: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        condition: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        bin_path: Option<String>,
        #[serde(default)]
        args: Vec<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        cwd: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        lint_after_run: Option<String>,
    },
}

impl ActionConfig {
    /// Title expression.
    pub fn title(&self) -> &str {
        match self {
            Self::OpenUri { title, .. } | Self::Ignore { title, .. } | Self::Run { title, .. } => {
                title
            }
        }
    }

    /// Condition expression, if any.
    pub fn condition(&self) -> Option<&str> {
        match self {
            Self::OpenUri { condition, .. }
            | Self::Ignore { condition, .. }
            | Self::Run { condition, .. } => condition.as_deref(),
        }
    }
}

/// Text inserted at a position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TextEdit {
    pub range: Range,
    pub new_text: String,
}

/// An action with every expression evaluated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ResolvedAction {
    OpenUri {
        title: String,
        uri: String,
    },
    Ignore {
        title: String,
        edit: TextEdit,
    },
    Run {
        title: String,
        bin_path: Option<String>,
        args: Vec<String>,
        cwd: Option<String>,
        lint_after_run: Option<String>,
    },
}

impl ResolvedAction {
    /// Evaluated title.
    pub fn title(&self) -> &str {
        match self {
            Self::OpenUri { title, .. } | Self::Ignore { title, .. } | Self::Run { title, .. } => {
                title
            }
        }
    }
}

/// Evaluates action descriptors for diagnostics of one document.
pub struct ActionResolver<'a> {
    evaluator: &'a dyn Evaluator,
    context: &'a Context,
    document: &'a dyn LineSource,
    eol: &'a str,
}

impl<'a> ActionResolver<'a> {
    /// Creates a resolver.
    ///
    /// # Arguments
    ///
    /// * `evaluator` - Runs title, condition and argument expressions
    /// * `context` - Bound as `$` and used for `${...}` substitution
    /// * `document` - Text of the linted document, for indentation
    /// * `eol` - Line terminator appended to inserted comments
    pub fn new(
        evaluator: &'a dyn Evaluator,
        context: &'a Context,
        document: &'a dyn LineSource,
        eol: &'a str,
    ) -> Self {
        Self {
            evaluator,
            context,
            document,
            eol,
        }
    }

    /// Resolves every applicable action for `record`, in configuration order.
    ///
    /// An action whose condition is falsy or fails, or whose expressions do
    /// not yield strings, is left out. Other actions are unaffected.
    pub async fn resolve(
        &self,
        actions: &[ActionConfig],
        record: &DiagnosticRecord,
    ) -> Vec<ResolvedAction> {
        let scope = Scope::action(self.context.to_value(), record.raw.clone());
        let mut resolved = Vec::new();
        for action in actions {
            if let Some(action) = self.resolve_one(action, record, &scope).await {
                resolved.push(action);
            }
        }
        resolved
    }

    async fn resolve_one(
        &self,
        action: &ActionConfig,
        record: &DiagnosticRecord,
        scope: &Scope,
    ) -> Option<ResolvedAction> {
        if let Some(condition) = action.condition() {
            let passed = self.evaluate(condition, scope).await?;
            if !passed.is_truthy() {
                trace!("Action '{}' skipped by condition", action.title());
                return None;
            }
        }
        let title = self.evaluate_string(action.title(), scope).await?;

        match action {
            ActionConfig::OpenUri { uri, .. } => {
                let uri = self.evaluate_string(uri, scope).await?;
                Some(ResolvedAction::OpenUri { title, uri })
            }
            ActionConfig::Ignore {
                comment, location, ..
            } => {
                let comment = self.evaluate_string(comment, scope).await?;
                let edit = self.comment_edit(record, comment, location.unwrap_or_default());
                Some(ResolvedAction::Ignore { title, edit })
            }
            ActionConfig::Run {
                bin_path,
                args,
                cwd,
                lint_after_run,
                ..
            } => Some(ResolvedAction::Run {
                title,
                bin_path: bin_path.as_deref().map(|b| self.context.substitute(b)),
                args: args.iter().map(|a| self.context.substitute(a)).collect(),
                cwd: cwd.as_deref().map(|c| self.context.substitute(c)),
                lint_after_run: lint_after_run.clone(),
            }),
        }
    }

    /// Builds the insertion for an ignore comment.
    pub fn comment_edit(
        &self,
        record: &DiagnosticRecord,
        comment: String,
        location: CommentLocation,
    ) -> TextEdit {
        let line = record.range.start.line;
        let line_text = self.document.line_text_or_empty(line);
        let (at, new_text) = match location {
            CommentLocation::StartFile => (Position::new(0, 0), self.terminated(comment)),
            CommentLocation::PreviousLine => (
                Position::new(line, 0),
                self.terminated(indent_lines(&comment, indent_of(line_text), self.eol)),
            ),
            CommentLocation::CurrentLine => (
                Position::new(line, line_text.chars().count() as u32),
                comment,
            ),
            CommentLocation::NextLine => (
                Position::new(line.saturating_add(1), 0),
                self.terminated(indent_lines(&comment, indent_of(line_text), self.eol)),
            ),
        };
        TextEdit {
            range: Range::new(at, at),
            new_text,
        }
    }

    fn terminated(&self, mut text: String) -> String {
        if !text.ends_with(self.eol) {
            text.push_str(self.eol);
        }
        text
    }

    async fn evaluate(&self, code: &str, scope: &Scope) -> Option<Value> {
        match self
            .evaluator
            .evaluate(EvalRequest::new(code, scope.clone()))
            .await
        {
            Ok(value) => Some(value),
            Err(e) => {
                debug!("Failed to evaluate action expression '{}': {}", code, e);
                None
            }
        }
    }

    async fn evaluate_string(&self, code: &str, scope: &Scope) -> Option<String> {
        match self.evaluate(code, scope).await? {
            Value::String(text) => Some(text),
            other => {
                debug!(
                    "Action expression '{}' produced {} instead of a string",
                    code,
                    other.type_name()
                );
                None
            }
        }
    }
}

/// Leading whitespace of a line.
fn indent_of(line: &str) -> &str {
    let end = line
        .char_indices()
        .find(|(_, c)| !c.is_whitespace())
        .map(|(i, _)| i)
        .unwrap_or(line.len());
    &line[..end]
}

fn indent_lines(comment: &str, indent: &str, eol: &str) -> String {
    comment
        .split('\n')
        .map(|line| format!("{}{}", indent, line))
        .collect::<Vec<_>>()
        .join(eol)
}
