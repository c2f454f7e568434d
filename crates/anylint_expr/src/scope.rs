//! Name bindings visible to an expression.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{ExprError, Value};

/// Binding name of the context object.
pub const CONTEXT_BINDING: &str = "$";
/// Binding name of a diagnostic's raw captured data.
pub const RAW_BINDING: &str = "$$";

/// The data exposed to one evaluation.
///
/// Nothing outside a scope is reachable from an expression. Identifiers are
/// looked up in the explicit bindings first, then among the fields of the
/// subject (if any).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Scope {
    bindings: BTreeMap<String, Value>,
    subject: Option<Value>,
}

impl Scope {
    /// Scope for conditions: `$` is the context.
    pub fn context(context: Value) -> Self {
        Self::default().with_binding(CONTEXT_BINDING, context)
    }

    /// Scope for follow-up actions: `$` is the context, `$$` the raw data
    /// captured with the diagnostic.
    pub fn action(context: Value, raw: Value) -> Self {
        Self::context(context).with_binding(RAW_BINDING, raw)
    }

    /// Scope for selectors: bare identifiers resolve to fields of `value`,
    /// which is also bound as `$`.
    pub fn selector(value: Value) -> Self {
        Self {
            bindings: BTreeMap::from([(CONTEXT_BINDING.to_string(), value.clone())]),
            subject: Some(value),
        }
    }

    /// Adds or replaces a binding.
    pub fn with_binding(mut self, name: impl Into<String>, value: Value) -> Self {
        self.bindings.insert(name.into(), value);
        self
    }

    /// Whether a binding with this name exists.
    pub fn has_binding(&self, name: &str) -> bool {
        self.bindings.contains_key(name)
    }

    /// Whether identifiers fall back to the fields of a subject.
    pub fn has_subject(&self) -> bool {
        self.subject.is_some()
    }

    /// Resolves an identifier.
    pub fn lookup(&self, name: &str) -> Result<Value, ExprError> {
        if let Some(value) = self.bindings.get(name) {
            return Ok(value.clone());
        }
        self.subject
            .as_ref()
            .and_then(Value::as_object)
            .and_then(|fields| fields.get(name))
            .cloned()
            .ok_or_else(|| ExprError::UndefinedIdentifier(name.to_string()))
    }
}

/// An expression paired with the scope to evaluate it in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvalRequest {
    /// Expression source.
    pub code: String,
    /// Exposed data.
    pub scope: Scope,
}

impl EvalRequest {
    /// Creates a request.
    pub fn new(code: impl Into<String>, scope: Scope) -> Self {
        Self {
            code: code.into(),
            scope,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_context_scope_binds_dollar() {
        let scope = Scope::context(Value::from(json!({"languageId": "rust"})));
        assert_eq!(
            scope.lookup("$").unwrap().member("languageId").unwrap(),
            Value::from("rust")
        );
        assert!(matches!(
            scope.lookup("languageId"),
            Err(ExprError::UndefinedIdentifier(_))
        ));
        assert!(matches!(scope.lookup("$$"), Err(ExprError::UndefinedIdentifier(_))));
    }

    #[test]
    fn test_action_scope_binds_raw_data() {
        let scope = Scope::action(Value::Null, Value::from(json!({"rule": "no-var"})));
        assert!(scope.has_binding("$$"));
        assert_eq!(
            scope.lookup("$$").unwrap().member("rule").unwrap(),
            Value::from("no-var")
        );
    }

    #[test]
    fn test_selector_scope_resolves_fields() {
        let scope = Scope::selector(Value::from(json!({"p": "a.ts", "l": 3})));
        assert!(scope.has_subject());
        assert_eq!(scope.lookup("p").unwrap(), Value::from("a.ts"));
        assert_eq!(scope.lookup("l").unwrap(), Value::Number(3.0));
        assert!(scope.lookup("$").unwrap().as_object().is_some());
        assert!(matches!(scope.lookup("missing"), Err(ExprError::UndefinedIdentifier(_))));
    }

    #[test]
    fn test_bindings_shadow_subject_fields() {
        let scope = Scope::selector(Value::from(json!({"x": 1}))).with_binding("x", Value::from(2.0));
        assert_eq!(scope.lookup("x").unwrap(), Value::Number(2.0));
    }
}
