//! Envelopes exchanged with the isolated evaluation worker.
//!
//! Both directions are msgpack-encoded with named fields, so an envelope is
//! `{id, type, payload}` on the way in and `{id, type, outcome: {result|error}}`
//! on the way out.

use serde::{Deserialize, Serialize};

use crate::{EvalRequest, ExprError, Scope, Value};

/// What an evaluation request is for. Informational only; every kind is
/// evaluated the same way.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RequestKind {
    /// Condition or title against the context.
    SafeEval,
    /// Action expression against the context and a diagnostic's raw data.
    SafeEvalDiagnosticAction,
    /// Selector against structured tool output.
    Select,
}

impl RequestKind {
    /// Classifies a request by the shape of its scope.
    pub fn for_scope(scope: &Scope) -> Self {
        if scope.has_subject() {
            Self::Select
        } else if scope.has_binding(crate::scope::RAW_BINDING) {
            Self::SafeEvalDiagnosticAction
        } else {
            Self::SafeEval
        }
    }
}

/// Request sent to the worker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestEnvelope {
    /// Correlation id, unique per channel.
    pub id: u64,
    /// Request kind.
    #[serde(rename = "type")]
    pub kind: RequestKind,
    /// Code and exposed data.
    pub payload: EvalRequest,
}

/// Correlation id of a request whose payload may not decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct RequestHeader {
    /// Correlation id.
    pub id: u64,
}

impl RequestHeader {
    /// Decodes only the id from a msgpack request.
    pub fn decode(bytes: &[u8]) -> Result<Self, ExprError> {
        rmp_serde::from_slice(bytes)
            .map_err(|e| ExprError::codec(format!("Invalid request header: {}", e)))
    }
}

/// Result or stringified failure of one evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ResponseOutcome {
    /// Evaluation succeeded.
    Result(Value),
    /// Evaluation failed with this cause.
    Error(String),
}

/// Response sent back by the worker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseEnvelope {
    /// Id of the request this answers.
    pub id: u64,
    /// Kind of the request this answers.
    #[serde(rename = "type")]
    pub kind: RequestKind,
    /// What happened.
    pub outcome: ResponseOutcome,
}

impl RequestEnvelope {
    /// Wraps a request under `id`.
    pub fn new(id: u64, payload: EvalRequest) -> Self {
        Self {
            id,
            kind: RequestKind::for_scope(&payload.scope),
            payload,
        }
    }

    /// Encodes to msgpack.
    pub fn encode(&self) -> Result<Vec<u8>, ExprError> {
        rmp_serde::to_vec_named(self)
            .map_err(|e| ExprError::codec(format!("Failed to serialize request: {}", e)))
    }

    /// Decodes from msgpack.
    pub fn decode(bytes: &[u8]) -> Result<Self, ExprError> {
        rmp_serde::from_slice(bytes)
            .map_err(|e| ExprError::codec(format!("Invalid request: {}", e)))
    }
}

impl ResponseEnvelope {
    /// Builds the response to `request` from an evaluation result.
    pub fn answer(request: &RequestEnvelope, result: Result<Value, ExprError>) -> Self {
        Self {
            id: request.id,
            kind: request.kind,
            outcome: match result {
                Ok(value) => ResponseOutcome::Result(value),
                Err(e) => ResponseOutcome::Error(e.to_string()),
            },
        }
    }

    /// Builds an error response for request `id`.
    pub fn failure(id: u64, kind: RequestKind, cause: impl Into<String>) -> Self {
        Self {
            id,
            kind,
            outcome: ResponseOutcome::Error(cause.into()),
        }
    }

    /// Encodes to msgpack.
    pub fn encode(&self) -> Result<Vec<u8>, ExprError> {
        rmp_serde::to_vec_named(self)
            .map_err(|e| ExprError::codec(format!("Failed to serialize response: {}", e)))
    }

    /// Decodes from msgpack.
    pub fn decode(bytes: &[u8]) -> Result<Self, ExprError> {
        rmp_serde::from_slice(bytes)
            .map_err(|e| ExprError::codec(format!("Invalid response: {}", e)))
    }
}
