//! # anylint_expr
//!
//! Sandboxed expression evaluation for AnyLint.
//!
//! User configuration contains small expressions: selectors that pluck fields
//! out of JSON/YAML tool output, conditions that decide whether a linter runs,
//! and titles/URIs for follow-up actions. This crate provides:
//!
//! - A restricted expression language (tokenizer, parser, interpreter) with
//!   no statements, no loops and no access to anything that was not exposed
//!   through a [`Scope`].
//! - The [`Evaluator`] trait, an asynchronous evaluation contract.
//! - Two evaluators satisfying it:
//!   - [`InlineEvaluator`]: evaluates on the calling thread and returns an
//!     already completed future.
//!   - [`EvaluationChannel`]: evaluates on an isolated worker thread. Requests
//!     cross the boundary as msgpack envelopes and responses are correlated
//!     back to their callers by id.
//!
//! ## Example
//!
//! ```rust,ignore
//! use anylint_expr::{EvalRequest, Evaluator, InlineEvaluator, Scope, Value};
//!
//! let evaluator = InlineEvaluator::new();
//! let entry = Value::from(serde_json::json!({ "path": "a.ts", "line": 3 }));
//! let file = evaluator
//!     .evaluate(EvalRequest::new("path", Scope::selector(entry)))
//!     .await?;
//! assert_eq!(file, Value::from("a.ts"));
//! ```

mod ast;
mod builtins;
mod channel;
mod error;
mod executor;
mod interpreter;
mod message;
mod parser;
mod scope;
mod tokenizer;
mod value;

pub use ast::{BinaryOp, Expr, UnaryOp};
pub use builtins::substitute_fields;
pub use channel::{EvaluationChannel, PendingRequests};
pub use error::ExprError;
pub use executor::{Evaluator, InlineEvaluator, evaluate_source};
pub use interpreter::Interpreter;
pub use message::{RequestEnvelope, RequestKind, ResponseEnvelope, ResponseOutcome};
pub use parser::parse;
pub use scope::{CONTEXT_BINDING, EvalRequest, RAW_BINDING, Scope};
pub use tokenizer::{Token, TokenKind, Tokenizer};
pub use value::Value;
