//! Linter configuration.
//!
//! The on-disk shape ([`LinterConfig`], [`DiagnosticConfig`]) mirrors the
//! camelCase settings users write. [`DiagnosticConfig::resolve`] turns the
//! optional-everything form into an immutable [`DiagnosticSpec`] with every
//! default filled in and the line template compiled.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use anylint_text::CoordinateFlags;
use jsonc_parser::ParseOptions;
use jsonschema::Validator;
use serde::{Deserialize, Serialize};

use crate::action::ActionConfig;
use crate::diagnostic::Severity;
use crate::format::{DEFAULT_FORMAT, DiagnosticTemplate};
use crate::linter::Event;
use crate::LinterError;

// Embed the schema
const SCHEMA_JSON: &str = include_str!("../../../schemas/v1/config.json");
static CONFIG_SCHEMA: OnceLock<Result<Validator, String>> = OnceLock::new();

fn config_schema() -> Result<&'static Validator, LinterError> {
    CONFIG_SCHEMA
        .get_or_init(|| {
            let schema_json: serde_json::Value =
                serde_json::from_str(SCHEMA_JSON).map_err(|e| e.to_string())?;
            Validator::new(&schema_json).map_err(|e| e.to_string())
        })
        .as_ref()
        .map_err(|e| LinterError::config(format!("Invalid embedded config schema: {}", e)))
}

/// Top-level configuration file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LinterConfig {
    /// Configured linters, in the order they run.
    #[serde(default)]
    pub linters: Vec<LinterDefinition>,

    /// Directory containing the configuration file.
    #[serde(skip)]
    pub base_dir: Option<PathBuf>,
}

impl LinterConfig {
    /// File names looked up by [`discover`](Self::discover), in order.
    pub const CONFIG_FILES: &'static [&'static str] = &[".anylint.jsonc", ".anylint.json"];

    /// Creates an empty configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Finds a configuration file in `dir`.
    pub fn discover(dir: &Path) -> Option<PathBuf> {
        Self::CONFIG_FILES
            .iter()
            .map(|name| dir.join(name))
            .find(|path| path.is_file())
    }

    /// Loads configuration from a file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, LinterError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .map_err(|e| LinterError::config(format!("Failed to read config: {}", e)))?;

        let mut config = Self::from_jsonc(&content)?;
        if let Some(parent) = path.parent() {
            config.base_dir = Some(parent.to_path_buf());
        }
        Ok(config)
    }

    /// Parses configuration from JSON with comments, validating it against
    /// the embedded schema.
    pub fn from_jsonc(content: &str) -> Result<Self, LinterError> {
        let value = jsonc_parser::parse_to_serde_value(content, &ParseOptions::default())
            .map_err(|e| LinterError::config(format!("Invalid JSON: {}", e)))?
            .unwrap_or_else(|| serde_json::Value::Object(serde_json::Map::new()));

        if let Err(e) = config_schema()?.validate(&value) {
            let error_msg = format!("{} at {}", e, e.instance_path());
            return Err(LinterError::config(format!(
                "Config validation failed: {}",
                error_msg
            )));
        }

        serde_json::from_value(value)
            .map_err(|e| LinterError::config(format!("Invalid config: {}", e)))
    }

    /// Looks up a linter by name.
    pub fn linter(&self, name: &str) -> Option<&LinterDefinition> {
        self.linters.iter().find(|l| l.name == name)
    }
}

/// One external tool and how to read its output.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinterDefinition {
    /// Name, also used as the diagnostic source.
    pub name: String,
    /// Skips the linter entirely.
    #[serde(default)]
    pub disabled: bool,
    /// Executable, with `${...}` context variables.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bin_path: Option<String>,
    /// Arguments, with `${...}` context variables.
    #[serde(default)]
    pub args: Vec<String>,
    /// Working directory, with `${...}` context variables.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cwd: Option<String>,
    /// Expression deciding whether to run, evaluated against `$`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
    /// Events that trigger the linter. Defaults to `[save]`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub on: Option<Vec<Event>>,
    /// How to read the tool's output.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diagnostic: Option<DiagnosticConfig>,
}

impl LinterDefinition {
    /// Whether the linter reacts to `event`. `force` always applies.
    pub fn runs_on(&self, event: Event) -> bool {
        event == Event::Force
            || self
                .on
                .as_deref()
                .unwrap_or(&[Event::Save])
                .contains(&event)
    }

    /// Resolves the diagnostic configuration, defaulting when absent.
    pub fn spec(&self) -> Result<DiagnosticSpec, LinterError> {
        self.diagnostic
            .as_ref()
            .map(DiagnosticConfig::resolve)
            .unwrap_or_else(|| DiagnosticConfig::default().resolve())
    }
}

/// Output format of a tool.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosticType {
    /// One diagnostic per line, read with a template.
    #[default]
    Lines,
    /// A JSON document read with selectors.
    Json,
    /// A YAML document read with selectors.
    Yaml,
}

/// Stream carrying the diagnostics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputStream {
    Stdout,
    #[default]
    Stderr,
}

/// Selector expressions for structured output.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Selectors {
    /// Evaluated against the document root; must yield an array.
    pub diagnostics: String,
    /// File of an entry.
    pub file: String,
    /// Nested array of an entry; each element is one diagnostic.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub_diagnostics: Option<String>,
    pub start_line: String,
    pub start_column: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_line: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_column: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub severity: Option<String>,
}

/// Diagnostic settings as written in the configuration file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagnosticConfig {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<DiagnosticType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<OutputStream>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line_zero_based: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub column_zero_based: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub column_character_based: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_column_inclusive: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub severity: Option<Severity>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub severity_map: Option<BTreeMap<String, Severity>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selectors: Option<Selectors>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actions: Option<Vec<ActionConfig>>,
}

impl DiagnosticConfig {
    /// Fills in defaults and compiles the template.
    ///
    /// Fails only when a structured type has no selectors.
    pub fn resolve(&self) -> Result<DiagnosticSpec, LinterError> {
        let mode = match self.kind.unwrap_or_default() {
            DiagnosticType::Lines => ExtractionMode::Lines {
                template: DiagnosticTemplate::compile(
                    self.format.as_deref().unwrap_or(DEFAULT_FORMAT),
                ),
            },
            DiagnosticType::Json => ExtractionMode::Json {
                selectors: self.required_selectors("json")?,
            },
            DiagnosticType::Yaml => ExtractionMode::Yaml {
                selectors: self.required_selectors("yaml")?,
            },
        };
        Ok(DiagnosticSpec {
            output: self.output.unwrap_or_default(),
            coordinates: CoordinateFlags {
                line_zero_based: self.line_zero_based.unwrap_or(false),
                column_zero_based: self.column_zero_based.unwrap_or(false),
                column_character_based: self.column_character_based.unwrap_or(false),
                end_column_inclusive: self.end_column_inclusive.unwrap_or(false),
            },
            severity: self.severity.unwrap_or_default(),
            severity_map: self
                .severity_map
                .clone()
                .unwrap_or_else(default_severity_map),
            actions: self.actions.clone().unwrap_or_default(),
            mode,
        })
    }

    fn required_selectors(&self, kind: &str) -> Result<Selectors, LinterError> {
        self.selectors.clone().ok_or_else(|| {
            LinterError::config(format!("Diagnostic type '{}' requires selectors", kind))
        })
    }
}

/// Identity map over the four severity names.
pub fn default_severity_map() -> BTreeMap<String, Severity> {
    Severity::ALL
        .into_iter()
        .map(|level| (level.as_str().to_string(), level))
        .collect()
}

/// How the diagnostics are laid out in the tool's output.
#[derive(Debug, Clone)]
pub enum ExtractionMode {
    /// Line by line through a compiled template.
    Lines { template: DiagnosticTemplate },
    /// JSON document through selectors.
    Json { selectors: Selectors },
    /// YAML document through selectors.
    Yaml { selectors: Selectors },
}

/// Resolved, immutable diagnostic configuration for one lint pass.
#[derive(Debug, Clone)]
pub struct DiagnosticSpec {
    /// Stream carrying the diagnostics.
    pub output: OutputStream,
    /// How the tool numbers positions.
    pub coordinates: CoordinateFlags,
    /// Severity when the tool reports none or an unmapped one.
    pub severity: Severity,
    /// Tool severity names to levels.
    pub severity_map: BTreeMap<String, Severity>,
    /// Follow-up actions offered for each diagnostic.
    pub actions: Vec<ActionConfig>,
    /// Extraction mode.
    pub mode: ExtractionMode,
}

impl DiagnosticSpec {
    /// Maps a reported severity name. Absent, empty and unmapped names fall
    /// back to the default severity.
    pub fn severity_for(&self, reported: Option<&str>) -> Severity {
        reported
            .filter(|name| !name.is_empty())
            .and_then(|name| self.severity_map.get(name))
            .copied()
            .unwrap_or(self.severity)
    }
}

impl Default for DiagnosticSpec {
    fn default() -> Self {
        Self {
            output: OutputStream::default(),
            coordinates: CoordinateFlags::default(),
            severity: Severity::default(),
            severity_map: default_severity_map(),
            actions: Vec::new(),
            mode: ExtractionMode::Lines {
                template: DiagnosticTemplate::compile(DEFAULT_FORMAT),
            },
        }
    }
}
