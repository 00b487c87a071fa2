//! Registry of submitted requests.
//!
//! The registry lock guards membership only. It is never held while a
//! request's own lock is taken: every operation that inspects request state
//! first copies the member list, releases the registry lock, then locks
//! requests one at a time.

mod notifier;

use parking_lot::RwLock;
use std::sync::Arc;
use tracing::{debug, info};

use crate::core::{Pipeline, RequestStatus};
use crate::dispatch::StageExecutor;
use crate::request::Request;

/// Process-wide collection of requests, in submission order.
#[derive(Debug)]
pub struct RequestRegistry {
    executor: Arc<StageExecutor>,
    requests: RwLock<Vec<Arc<Request>>>,
}

impl RequestRegistry {
    /// Creates an empty registry dispatching through `executor`.
    #[must_use]
    pub fn new(executor: Arc<StageExecutor>) -> Self {
        Self {
            executor,
            requests: RwLock::new(Vec::new()),
        }
    }

    /// Registers a pipeline and dispatches its first stage.
    ///
    /// The request is registered before dispatch so that a completion
    /// arriving while the stage is still being dispatched can find it; the
    /// registry lock is released before dispatch starts.
    pub fn submit(&self, pipeline: Pipeline) -> String {
        let stages = pipeline.len();
        let request = Arc::new(Request::new(pipeline, self.executor.clone()));
        let id = request.id().to_string();

        self.requests.write().push(request.clone());
        request.advance();

        info!(request_id = %id, stages, "Submitted request");
        id
    }

    /// Looks up a request by identifier.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<Arc<Request>> {
        self.requests.read().iter().find(|r| r.id() == id).cloned()
    }

    /// Identifier and status of every request.
    #[must_use]
    pub fn list(&self) -> Vec<(String, RequestStatus)> {
        self.snapshot()
            .into_iter()
            .map(|r| (r.id().to_string(), r.status()))
            .collect()
    }

    /// Removes every request observed finished; returns how many.
    ///
    /// A finished request never becomes active again, so removing from a
    /// stale observation is safe. Requests that finish after the
    /// observation stay for the next cleanup.
    pub fn cleanup_finished(&self) -> usize {
        let finished: Vec<Arc<Request>> = self
            .snapshot()
            .into_iter()
            .filter(|r| r.is_finished())
            .collect();
        if finished.is_empty() {
            return 0;
        }

        let mut requests = self.requests.write();
        let before = requests.len();
        requests.retain(|r| !finished.iter().any(|f| Arc::ptr_eq(f, r)));
        let removed = before - requests.len();

        debug!(removed, remaining = requests.len(), "Cleaned up finished requests");
        removed
    }

    /// Removes a request regardless of its state.
    ///
    /// Commands already dispatched are not stopped; their completions are
    /// later dropped as unknown.
    pub fn cancel(&self, id: &str) -> bool {
        let mut requests = self.requests.write();
        let Some(index) = requests.iter().position(|r| r.id() == id) else {
            return false;
        };
        requests.remove(index);

        info!(request_id = %id, "Cancelled request");
        true
    }

    /// Number of registered requests.
    #[must_use]
    pub fn len(&self) -> usize {
        self.requests.read().len()
    }

    /// Returns true if no requests are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.requests.read().is_empty()
    }

    fn snapshot(&self) -> Vec<Arc<Request>> {
        self.requests.read().clone()
    }
}
