//! Deciding which linters run for an event, and how.
//!
//! Spawning the tools is left to the caller. This module only produces the
//! [`Invocation`]s: command line, working directory, stream to read and
//! the resolved [`DiagnosticSpec`] to extract with.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use anylint_expr::{EvalRequest, Evaluator, Scope};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::{DiagnosticSpec, LinterConfig, LinterDefinition, OutputStream};
use crate::context::Context;

/// What triggered a lint pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Event {
    /// The document was edited.
    Change,
    /// The document was saved.
    Save,
    /// Explicit request; runs every enabled linter.
    Force,
    /// The document was opened.
    Open,
}

impl Event {
    /// Lowercase name as used in configuration.
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::Change => "change",
            Event::Save => "save",
            Event::Force => "force",
            Event::Open => "open",
        }
    }

    /// How long a scheduler should wait for further events before linting.
    pub fn debounce(&self) -> Duration {
        match self {
            Event::Change => Duration::from_millis(500),
            Event::Save | Event::Force | Event::Open => Duration::ZERO,
        }
    }

    /// Whether the document text is fed to the tool through stdin.
    ///
    /// Edits are not on disk yet, so `change` passes pipe the buffer.
    pub fn pipes_stdin(&self) -> bool {
        matches!(self, Event::Change)
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Event {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "change" => Ok(Event::Change),
            "save" => Ok(Event::Save),
            "force" => Ok(Event::Force),
            "open" => Ok(Event::Open),
            _ => Err(format!(
                "unknown event '{}', expected one of: change, save, force, open",
                s
            )),
        }
    }
}

/// A planned run of one linter.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Invocation {
    /// Linter name, used as the diagnostic source.
    pub name: String,
    /// Executable after `${...}` substitution.
    pub bin_path: String,
    /// Arguments after `${...}` substitution.
    pub args: Vec<String>,
    /// Working directory; relative reported files resolve against it.
    pub cwd: String,
    /// Stream carrying the diagnostics.
    pub output: OutputStream,
    /// Whether the document text goes to the tool's stdin.
    pub pipe_stdin: bool,
    /// How to read the output.
    #[serde(skip)]
    pub spec: DiagnosticSpec,
}

/// Plans the lint pass for `event`.
///
/// Linters run in configuration order. A linter is skipped when it does not
/// listen to the event, is disabled, has no `binPath`, has a falsy
/// condition, or has an unusable diagnostic configuration. A condition that
/// fails to evaluate does not skip the linter.
pub async fn plan_lint_pass(
    config: &LinterConfig,
    context: &Context,
    event: Event,
    evaluator: &dyn Evaluator,
) -> Vec<Invocation> {
    let mut invocations = Vec::new();
    for linter in &config.linters {
        if let Some(invocation) = plan_linter(linter, context, event, evaluator).await {
            invocations.push(invocation);
        }
    }
    info!(
        "Planned {} of {} linters for '{}'",
        invocations.len(),
        config.linters.len(),
        event
    );
    invocations
}

async fn plan_linter(
    linter: &LinterDefinition,
    context: &Context,
    event: Event,
    evaluator: &dyn Evaluator,
) -> Option<Invocation> {
    if !linter.runs_on(event) {
        debug!("Linter '{}' does not run on '{}'", linter.name, event);
        return None;
    }
    if linter.disabled {
        debug!("Linter '{}' is disabled", linter.name);
        return None;
    }
    let Some(bin_path) = linter.bin_path.as_deref().filter(|b| !b.is_empty()) else {
        debug!("Linter '{}' has no binPath", linter.name);
        return None;
    };

    if let Some(condition) = &linter.condition {
        let request = EvalRequest::new(condition.as_str(), Scope::context(context.to_value()));
        match evaluator.evaluate(request).await {
            Ok(value) if !value.is_truthy() => {
                debug!("Linter '{}' skipped by condition", linter.name);
                return None;
            }
            Ok(_) => {}
            Err(e) => warn!(
                "Failed to evaluate condition of linter '{}': {}",
                linter.name, e
            ),
        }
    }

    let spec = match linter.spec() {
        Ok(spec) => spec,
        Err(e) => {
            warn!("Skipping linter '{}': {}", linter.name, e);
            return None;
        }
    };

    Some(Invocation {
        name: linter.name.clone(),
        bin_path: context.substitute(bin_path),
        args: linter.args.iter().map(|a| context.substitute(a)).collect(),
        cwd: linter
            .cwd
            .as_deref()
            .map(|c| context.substitute(c))
            .unwrap_or_else(|| context.cwd.clone()),
        output: spec.output,
        pipe_stdin: event.pipes_stdin(),
        spec,
    })
}
