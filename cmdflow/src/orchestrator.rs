//! The orchestrator: one explicitly constructed object shared by every
//! collaborator of the host.

use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::config::OrchestratorConfig;
use crate::core::{CompletionEvent, Pipeline, RequestStatus};
use crate::dispatch::{CommandDispatcher, CommandInterface, StageExecutor};
use crate::errors::{CmdflowError, NotifyError};
use crate::registry::RequestRegistry;
use crate::request::{Request, RequestDetail};

/// Batch-command orchestrator.
///
/// Create one at host start-up and hand out `Arc<Orchestrator>` clones to
/// the API layer and the completion path.
#[derive(Debug)]
pub struct Orchestrator {
    config: OrchestratorConfig,
    registry: RequestRegistry,
}

impl Orchestrator {
    /// Creates an orchestrator dispatching into `interface`.
    #[must_use]
    pub fn new(interface: Arc<dyn CommandInterface>, config: OrchestratorConfig) -> Self {
        let executor = StageExecutor::new(CommandDispatcher::new(interface), &config);
        Self {
            registry: RequestRegistry::new(Arc::new(executor)),
            config,
        }
    }

    /// The active configuration.
    #[must_use]
    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    /// Submits a pipeline; returns its request identifier once the first
    /// stage is dispatched.
    pub fn submit(&self, pipeline: Pipeline) -> String {
        self.registry.submit(pipeline)
    }

    /// Returns the live request handle.
    #[must_use]
    pub fn request(&self, id: &str) -> Option<Arc<Request>> {
        self.registry.get(id)
    }

    /// Returns a snapshot of the request.
    pub fn get(&self, id: &str) -> Result<RequestDetail, CmdflowError> {
        self.registry
            .get(id)
            .map(|r| r.detail())
            .ok_or_else(|| CmdflowError::RequestNotFound(id.to_string()))
    }

    /// Status of every request, keyed by identifier.
    #[must_use]
    pub fn list(&self) -> BTreeMap<String, RequestStatus> {
        self.registry.list().into_iter().collect()
    }

    /// Removes finished requests; returns how many were removed.
    pub fn cleanup_finished(&self) -> usize {
        self.registry.cleanup_finished()
    }

    /// Removes a request regardless of state.
    pub fn cancel(&self, id: &str) -> bool {
        self.registry.cancel(id)
    }

    /// Delivers one completion event.
    pub fn notify(&self, event: CompletionEvent) -> Result<String, NotifyError> {
        self.registry.notify(event)
    }

    /// Creates the bounded completion channel sized from the configuration.
    #[must_use]
    pub fn completion_channel(
        &self,
    ) -> (mpsc::Sender<CompletionEvent>, mpsc::Receiver<CompletionEvent>) {
        mpsc::channel(self.config.completion_channel_capacity.max(1))
    }

    /// Spawns a task applying every event received on `events`.
    ///
    /// The task ends when all senders are dropped and returns the number of
    /// events that were applied. Must be called within a tokio runtime.
    pub fn spawn_completion_listener(
        self: &Arc<Self>,
        mut events: mpsc::Receiver<CompletionEvent>,
    ) -> JoinHandle<usize> {
        let orchestrator = Arc::clone(self);
        tokio::spawn(async move {
            let mut applied = 0;
            while let Some(event) = events.recv().await {
                if orchestrator.notify(event).is_ok() {
                    applied += 1;
                }
            }
            info!(applied, "Completion listener stopped");
            applied
        })
    }

    /// Opens a completion channel and spawns its listener.
    pub fn start_completion_listener(
        self: &Arc<Self>,
    ) -> (mpsc::Sender<CompletionEvent>, JoinHandle<usize>) {
        let (sender, receiver) = self.completion_channel();
        debug!(
            capacity = self.config.completion_channel_capacity,
            "Starting completion listener"
        );
        (sender, self.spawn_completion_listener(receiver))
    }
}
