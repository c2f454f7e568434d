//! Expression error types.

use thiserror::Error;

/// Errors that can occur while parsing or evaluating an expression.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExprError {
    /// The source could not be tokenized or parsed.
    #[error("Syntax error at {position}: {message}")]
    Syntax {
        /// Byte offset in the source where the problem was detected.
        position: usize,
        /// What went wrong.
        message: String,
    },

    /// An identifier is not bound in the scope.
    #[error("{0} is not defined")]
    UndefinedIdentifier(String),

    /// A member or index was read from a value that has none.
    #[error("Cannot read '{member}' of {target}")]
    InvalidAccess {
        /// The member or index that was read.
        member: String,
        /// Type name of the value it was read from.
        target: String,
    },

    /// Something that is not an exposed function was invoked.
    #[error("{0} is not a function")]
    NotCallable(String),

    /// An operand or argument had an unusable type.
    #[error("Type error: {0}")]
    Type(String),

    /// The isolated evaluator reported a failure.
    #[error("Evaluation of `{code}` failed: {cause}")]
    Rejected {
        /// The expression source that was submitted.
        code: String,
        /// Stringified cause reported by the worker.
        cause: String,
    },

    /// The evaluation channel shut down before a response arrived.
    #[error("Evaluation channel closed")]
    ChannelClosed,

    /// An envelope could not be encoded or decoded.
    #[error("Codec error: {0}")]
    Codec(String),

    /// The evaluation worker could not be started.
    #[error("Failed to start evaluation worker: {0}")]
    Worker(String),
}

impl ExprError {
    /// Creates a syntax error.
    pub fn syntax(position: usize, message: impl Into<String>) -> Self {
        Self::Syntax {
            position,
            message: message.into(),
        }
    }

    /// Creates an invalid access error.
    pub fn invalid_access(member: impl Into<String>, target: impl Into<String>) -> Self {
        Self::InvalidAccess {
            member: member.into(),
            target: target.into(),
        }
    }

    /// Creates a not-callable error.
    pub fn not_callable(name: impl Into<String>) -> Self {
        Self::NotCallable(name.into())
    }

    /// Creates a type error.
    pub fn type_error(message: impl Into<String>) -> Self {
        Self::Type(message.into())
    }

    /// Creates a rejection for a submitted expression.
    pub fn rejected(code: impl Into<String>, cause: impl Into<String>) -> Self {
        Self::Rejected {
            code: code.into(),
            cause: cause.into(),
        }
    }

    /// Creates a codec error.
    pub fn codec(message: impl Into<String>) -> Self {
        Self::Codec(message.into())
    }
}
