//! Request/response multiplexing over an isolated evaluation worker.
//!
//! The worker owns its own interpreter and parse cache on a dedicated thread
//! and only ever sees msgpack-encoded envelopes. Callers get a future per
//! submission; a single listener thread matches responses back to those
//! futures by correlation id.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc;
use std::thread::{self, JoinHandle};

use futures_util::FutureExt;
use futures_util::future::{self, BoxFuture};
use parking_lot::Mutex;
use tokio::sync::oneshot;
use tracing::{debug, trace, warn};

use crate::message::{
    RequestEnvelope, RequestHeader, RequestKind, ResponseEnvelope, ResponseOutcome,
};
use crate::{EvalRequest, Evaluator, ExprError, InlineEvaluator, Value};

type Completion = oneshot::Sender<Result<Value, ExprError>>;

struct Pending {
    code: String,
    completion: Completion,
}

/// Pending evaluations keyed by correlation id.
///
/// Ids come from a monotonically increasing counter starting at 0 and are
/// never reused. Each entry is removed on its first resolution, so a repeated
/// or unknown response id finds nothing and is dropped.
#[derive(Default)]
pub struct PendingRequests {
    next_id: AtomicU64,
    entries: Mutex<HashMap<u64, Pending>>,
}

impl PendingRequests {
    /// Creates an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocates the next id and records a pending completion for `code`.
    pub fn register(
        &self,
        code: impl Into<String>,
    ) -> (u64, oneshot::Receiver<Result<Value, ExprError>>) {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (completion, receiver) = oneshot::channel();
        self.entries.lock().insert(
            id,
            Pending {
                code: code.into(),
                completion,
            },
        );
        (id, receiver)
    }

    /// Resolves or rejects the entry a response refers to.
    ///
    /// Returns `false` when no entry with that id is pending.
    pub fn deliver(&self, response: ResponseEnvelope) -> bool {
        let Some(pending) = self.entries.lock().remove(&response.id) else {
            trace!("Dropping response for unknown id {}", response.id);
            return false;
        };
        let result = match response.outcome {
            ResponseOutcome::Result(value) => Ok(value),
            ResponseOutcome::Error(cause) => Err(ExprError::rejected(pending.code, cause)),
        };
        // The caller may have stopped waiting.
        let _ = pending.completion.send(result);
        true
    }

    /// Forgets an entry without resolving it.
    pub fn discard(&self, id: u64) -> bool {
        self.entries.lock().remove(&id).is_some()
    }

    /// Rejects every pending entry with `error`. Returns how many there were.
    pub fn reject_all(&self, error: ExprError) -> usize {
        let drained: Vec<Pending> = self.entries.lock().drain().map(|(_, p)| p).collect();
        let count = drained.len();
        for pending in drained {
            let _ = pending.completion.send(Err(error.clone()));
        }
        count
    }

    /// Number of unresolved entries.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Whether nothing is pending.
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

/// Expression evaluation on an isolated worker thread.
///
/// Open one per subsystem and share it (it is `Send + Sync`); independent
/// instances do not interact. Dropping the channel stops the worker and
/// rejects whatever is still pending with [`ExprError::ChannelClosed`].
pub struct EvaluationChannel {
    pending: Arc<PendingRequests>,
    requests: Mutex<Option<mpsc::Sender<Vec<u8>>>>,
    threads: Mutex<Vec<JoinHandle<()>>>,
}

impl EvaluationChannel {
    /// Starts the worker and the response listener.
    pub fn open() -> Result<Self, ExprError> {
        let pending = Arc::new(PendingRequests::new());
        let (request_tx, request_rx) = mpsc::channel::<Vec<u8>>();
        let (response_tx, response_rx) = mpsc::channel::<Vec<u8>>();

        let worker = thread::Builder::new()
            .name("anylint-eval-worker".to_string())
            .spawn(move || run_worker(request_rx, response_tx))
            .map_err(|e| ExprError::Worker(e.to_string()))?;

        let listener_pending = Arc::clone(&pending);
        let listener = thread::Builder::new()
            .name("anylint-eval-listener".to_string())
            .spawn(move || run_listener(response_rx, &listener_pending))
            .map_err(|e| ExprError::Worker(e.to_string()))?;

        debug!("Evaluation channel opened");
        Ok(Self {
            pending,
            requests: Mutex::new(Some(request_tx)),
            threads: Mutex::new(vec![worker, listener]),
        })
    }

    /// Submits an evaluation and returns a future for its result.
    ///
    /// The future resolves exactly once: with the worker's value, with
    /// [`ExprError::Rejected`] when evaluation failed, or with
    /// [`ExprError::ChannelClosed`] when the channel shut down first.
    pub fn submit(&self, request: EvalRequest) -> BoxFuture<'static, Result<Value, ExprError>> {
        let (id, receiver) = self.pending.register(request.code.as_str());
        let envelope = RequestEnvelope::new(id, request);
        trace!("Submitting request {} ({:?})", id, envelope.kind);

        let sent = envelope.encode().and_then(|bytes| match self.requests.lock().as_ref() {
            Some(sender) => sender.send(bytes).map_err(|_| ExprError::ChannelClosed),
            None => Err(ExprError::ChannelClosed),
        });
        if let Err(e) = sent {
            self.pending.discard(id);
            return future::ready(Err(e)).boxed();
        }

        async move {
            receiver
                .await
                .unwrap_or_else(|_| Err(ExprError::ChannelClosed))
        }
        .boxed()
    }

    /// Number of submissions still waiting for a response.
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Stops the worker, waits for both threads and rejects what is left.
    ///
    /// Requests already queued are still answered. Calling this more than
    /// once is harmless.
    pub fn shutdown(&self) {
        let Some(sender) = self.requests.lock().take() else {
            return;
        };
        drop(sender);
        for handle in self.threads.lock().drain(..) {
            if handle.join().is_err() {
                warn!("Evaluation thread panicked");
            }
        }
        let rejected = self.pending.reject_all(ExprError::ChannelClosed);
        debug!("Evaluation channel closed ({} pending rejected)", rejected);
    }
}

impl Drop for EvaluationChannel {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl Evaluator for EvaluationChannel {
    fn evaluate(&self, request: EvalRequest) -> BoxFuture<'_, Result<Value, ExprError>> {
        self.submit(request)
    }
}

fn run_worker(requests: mpsc::Receiver<Vec<u8>>, responses: mpsc::Sender<Vec<u8>>) {
    let evaluator = InlineEvaluator::new();
    for bytes in requests {
        let response = match RequestEnvelope::decode(&bytes) {
            Ok(request) => {
                let result = evaluator.evaluate_now(&request.payload.code, &request.payload.scope);
                ResponseEnvelope::answer(&request, result)
            }
            Err(e) => match RequestHeader::decode(&bytes) {
                Ok(header) => {
                    ResponseEnvelope::failure(header.id, RequestKind::SafeEval, e.to_string())
                }
                Err(_) => {
                    warn!("Worker dropped an unreadable request: {}", e);
                    continue;
                }
            },
        };
        let Some(encoded) = encode_response(response) else {
            continue;
        };
        if responses.send(encoded).is_err() {
            break;
        }
    }
    trace!("Evaluation worker stopped");
}

/// Encodes `response`, degrading to an error answer for the same id when the
/// result cannot be encoded.
fn encode_response(response: ResponseEnvelope) -> Option<Vec<u8>> {
    let (id, kind) = (response.id, response.kind);
    let cause = match response.encode() {
        Ok(bytes) => return Some(bytes),
        Err(e) => e.to_string(),
    };
    match ResponseEnvelope::failure(id, kind, cause).encode() {
        Ok(bytes) => Some(bytes),
        Err(e) => {
            warn!("Worker could not encode response {}: {}", id, e);
            None
        }
    }
}

fn run_listener(responses: mpsc::Receiver<Vec<u8>>, pending: &PendingRequests) {
    for bytes in responses {
        match ResponseEnvelope::decode(&bytes) {
            Ok(response) => {
                pending.deliver(response);
            }
            Err(e) => warn!("Listener dropped a response: {}", e),
        }
    }
    trace!("Evaluation listener stopped");
}
