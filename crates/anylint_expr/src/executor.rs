//! The asynchronous evaluation contract.
//!
//! Extraction code is written once against [`Evaluator`] and works the same
//! whether expressions run in-process ([`InlineEvaluator`]) or on an isolated
//! worker ([`EvaluationChannel`](crate::EvaluationChannel)).

use std::collections::HashMap;
use std::sync::Arc;

use futures_util::FutureExt;
use futures_util::future::{self, BoxFuture};
use parking_lot::Mutex;
use tracing::trace;

use crate::ast::Expr;
use crate::{EvalRequest, ExprError, Interpreter, Scope, Value, parse};

/// Upper bound on cached parse trees before the cache is reset.
const PARSE_CACHE_LIMIT: usize = 1024;

/// Something that can evaluate expressions.
///
/// Every evaluation may suspend. Callers must not assume that concurrent
/// evaluations complete in submission order.
pub trait Evaluator: Send + Sync {
    /// Evaluates `request.code` against `request.scope`.
    fn evaluate(&self, request: EvalRequest) -> BoxFuture<'_, Result<Value, ExprError>>;
}

impl<T: Evaluator + ?Sized> Evaluator for Arc<T> {
    fn evaluate(&self, request: EvalRequest) -> BoxFuture<'_, Result<Value, ExprError>> {
        (**self).evaluate(request)
    }
}

/// Parses and evaluates a source string in one step, without caching.
pub fn evaluate_source(code: &str, scope: &Scope) -> Result<Value, ExprError> {
    let expr = parse(code)?;
    Interpreter::new(scope).evaluate(&expr)
}

/// In-process evaluator.
///
/// Results are available immediately; the returned future is already
/// complete. Parse trees are cached per source string, since the same
/// selectors run once per diagnostic.
#[derive(Default)]
pub struct InlineEvaluator {
    cache: Mutex<HashMap<String, Arc<Expr>>>,
}

impl InlineEvaluator {
    /// Creates an evaluator with an empty parse cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Evaluates synchronously.
    pub fn evaluate_now(&self, code: &str, scope: &Scope) -> Result<Value, ExprError> {
        let expr = self.parsed(code)?;
        Interpreter::new(scope).evaluate(&expr)
    }

    fn parsed(&self, code: &str) -> Result<Arc<Expr>, ExprError> {
        if let Some(expr) = self.cache.lock().get(code) {
            return Ok(Arc::clone(expr));
        }
        let expr = Arc::new(parse(code)?);
        let mut cache = self.cache.lock();
        if cache.len() >= PARSE_CACHE_LIMIT {
            trace!("Parse cache full, clearing {} entries", cache.len());
            cache.clear();
        }
        cache.insert(code.to_string(), Arc::clone(&expr));
        Ok(expr)
    }

    #[cfg(test)]
    fn cached(&self) -> usize {
        self.cache.lock().len()
    }
}

impl Evaluator for InlineEvaluator {
    fn evaluate(&self, request: EvalRequest) -> BoxFuture<'_, Result<Value, ExprError>> {
        future::ready(self.evaluate_now(&request.code, &request.scope)).boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[tokio::test]
    async fn test_inline_evaluator_resolves() {
        let evaluator = InlineEvaluator::new();
        let request = EvalRequest::new(
            "$.languageId",
            Scope::context(Value::from(json!({"languageId": "rust"}))),
        );
        assert_eq!(evaluator.evaluate(request).await.unwrap(), Value::from("rust"));
    }

    #[tokio::test]
    async fn test_inline_evaluator_surfaces_errors() {
        let evaluator = InlineEvaluator::new();
        let err = evaluator
            .evaluate(EvalRequest::new("1 +", Scope::default()))
            .await
            .unwrap_err();
        assert!(matches!(err, ExprError::Syntax { .. }));
    }

    #[test]
    fn test_parse_cache_is_reused() {
        let evaluator = InlineEvaluator::new();
        for n in 0..3 {
            let scope = Scope::selector(Value::from(json!({"n": n})));
            assert_eq!(
                evaluator.evaluate_now("n * 2", &scope).unwrap(),
                Value::Number(f64::from(n * 2))
            );
        }
        assert_eq!(evaluator.cached(), 1);
    }

    #[test]
    fn test_parse_failures_are_not_cached() {
        let evaluator = InlineEvaluator::new();
        assert!(evaluator.evaluate_now("(", &Scope::default()).is_err());
        assert_eq!(evaluator.cached(), 0);
    }

    #[test]
    fn test_evaluate_source() {
        assert_eq!(
            evaluate_source("[1,2].length", &Scope::default()).unwrap(),
            Value::Number(2.0)
        );
    }

    #[tokio::test]
    async fn test_arc_evaluator_delegates() {
        let evaluator: Arc<dyn Evaluator> = Arc::new(InlineEvaluator::new());
        let value = evaluator
            .evaluate(EvalRequest::new("'a' + 'b'", Scope::default()))
            .await
            .unwrap();
        assert_eq!(value, Value::from("ab"));
    }
}
