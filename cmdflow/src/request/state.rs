//! The request state machine.
//!
//! A request owns its waiting stages and the outcomes of every dispatched
//! command. All transitions run under the request's own mutex:
//!
//! - `complete` moves one outcome from running to finished or failed
//! - `advance` pops and dispatches waiting stages while nothing is running
//!
//! Dispatch happens while the mutex is held, so a completion racing with the
//! dispatch of its own command waits for the outcome to be in place.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

use super::{OutcomeView, RequestDetail};
use crate::core::{
    CommandOutcome, CommandPayload, CommandTag, CompletionEvent, Pipeline, RequestStatus, Stage,
};
use crate::dispatch::StageExecutor;

#[derive(Debug, Default)]
struct RequestState {
    waiting: VecDeque<Stage>,
    running: Vec<CommandOutcome>,
    finished: Vec<CommandOutcome>,
    failed: Vec<CommandOutcome>,
    /// Refused commands kept without an outcome; each counts as a failure.
    dropped: Vec<CommandTag>,
    /// Ordinal of the next stage to dispatch.
    next_stage: usize,
}

impl RequestState {
    fn is_ready(&self) -> bool {
        self.running.is_empty() && !self.waiting.is_empty()
    }

    fn is_finished(&self) -> bool {
        self.running.is_empty() && self.waiting.is_empty()
    }

    fn has_failed(&self) -> bool {
        !self.failed.is_empty() || !self.dropped.is_empty()
    }
}

/// One submitted pipeline and its execution state.
pub struct Request {
    id: String,
    created_at: DateTime<Utc>,
    executor: Arc<StageExecutor>,
    state: Mutex<RequestState>,
}

impl Request {
    /// Creates a request holding `pipeline` with nothing dispatched yet.
    ///
    /// Call [`Request::advance`] to dispatch the first stage.
    #[must_use]
    pub fn new(pipeline: Pipeline, executor: Arc<StageExecutor>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            created_at: Utc::now(),
            executor,
            state: Mutex::new(RequestState {
                waiting: pipeline.into(),
                ..RequestState::default()
            }),
        }
    }

    /// Creates a request and synchronously dispatches its first stage.
    #[must_use]
    pub fn launch(pipeline: Pipeline, executor: Arc<StageExecutor>) -> Arc<Self> {
        let request = Arc::new(Self::new(pipeline, executor));
        request.advance();
        request
    }

    /// The unique request identifier.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// When the request was created.
    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Dispatches waiting stages until one leaves commands running or none
    /// remain. Returns the number of stages dispatched.
    ///
    /// A no-op unless the request is ready.
    pub fn advance(&self) -> usize {
        let mut state = self.state.lock();
        let mut dispatched = 0;

        while state.running.is_empty() {
            let Some(stage) = state.waiting.pop_front() else {
                break;
            };
            let ordinal = state.next_stage;
            state.next_stage += 1;
            dispatched += 1;

            let prefix = format!("{}:{}", self.id, ordinal);
            let success_code = self.executor.success_code();
            let dispatch = self.executor.run_stage(&stage, &prefix);
            state.dropped.extend(dispatch.dropped);
            for outcome in dispatch.outcomes {
                if outcome.is_pending() {
                    state.running.push(outcome);
                } else if outcome.succeeded(success_code) {
                    state.finished.push(outcome);
                } else {
                    state.failed.push(outcome);
                }
            }

            debug!(
                request_id = %self.id,
                stage = ordinal,
                commands = stage.len(),
                running = state.running.len(),
                "Dispatched stage"
            );
        }

        if dispatched > 0 && state.is_finished() {
            info!(
                request_id = %self.id,
                status = %Self::status_of(&state),
                "Request finished"
            );
        }

        dispatched
    }

    /// Records a completion for a running command.
    ///
    /// Returns false, leaving the request untouched, when no running outcome
    /// carries the tag.
    pub fn complete(&self, event: CompletionEvent) -> bool {
        let mut state = self.state.lock();
        let Some(index) = state.running.iter().position(|o| *o.tag() == event.tag) else {
            return false;
        };

        let mut outcome = state.running.remove(index);
        outcome.record(event);
        if outcome.succeeded(self.executor.success_code()) {
            state.finished.push(outcome);
        } else {
            debug!(
                request_id = %self.id,
                tag = %outcome.tag(),
                code = ?outcome.code(),
                "Command failed"
            );
            state.failed.push(outcome);
        }

        if state.is_finished() {
            info!(
                request_id = %self.id,
                status = %Self::status_of(&state),
                "Request finished"
            );
        }
        true
    }

    /// Returns true if a command with `tag` is running.
    #[must_use]
    pub fn is_running(&self, tag: &str) -> bool {
        self.state.lock().running.iter().any(|o| o.tag() == tag)
    }

    /// Returns true if nothing is running but stages are waiting.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.state.lock().is_ready()
    }

    /// Returns true if stages are waiting.
    #[must_use]
    pub fn is_waiting(&self) -> bool {
        !self.state.lock().waiting.is_empty()
    }

    /// Returns true if nothing is running or waiting.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.state.lock().is_finished()
    }

    /// Returns true if any command failed or was refused.
    #[must_use]
    pub fn has_failed(&self) -> bool {
        self.state.lock().has_failed()
    }

    /// The aggregate status.
    #[must_use]
    pub fn status(&self) -> RequestStatus {
        Self::status_of(&self.state.lock())
    }

    fn status_of(state: &RequestState) -> RequestStatus {
        RequestStatus::from_flags(state.is_finished(), state.has_failed())
    }

    /// A consistent snapshot of the whole request.
    #[must_use]
    pub fn detail(&self) -> RequestDetail {
        let state = self.state.lock();
        let views = |outcomes: &[CommandOutcome]| -> Vec<OutcomeView> {
            outcomes.iter().map(OutcomeView::from).collect()
        };

        RequestDetail {
            uuid: self.id.clone(),
            status: Self::status_of(&state),
            created_at: self.created_at,
            running: views(&state.running),
            finished: views(&state.finished),
            waiting: state
                .waiting
                .iter()
                .map(|stage| stage.iter().map(CommandPayload::describe).collect())
                .collect(),
            failed: views(&state.failed),
            dropped: state.dropped.iter().map(ToString::to_string).collect(),
            is_waiting: !state.waiting.is_empty(),
            is_finished: state.is_finished(),
            has_failed: state.has_failed(),
        }
    }
}

impl std::fmt::Debug for Request {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("Request")
            .field("id", &self.id)
            .field("waiting", &state.waiting.len())
            .field("running", &state.running.len())
            .field("finished", &state.finished.len())
            .field("failed", &state.failed.len())
            .field("dropped", &state.dropped.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DispatchFailurePolicy, OrchestratorConfig};
    use crate::dispatch::CommandDispatcher;
    use crate::testing::RecordingInterface;
    use pretty_assertions::assert_eq;

    fn executor(interface: &Arc<RecordingInterface>) -> Arc<StageExecutor> {
        Arc::new(StageExecutor::new(
            CommandDispatcher::new(interface.clone()),
            &OrchestratorConfig::default(),
        ))
    }

    fn op(name: &str) -> CommandPayload {
        CommandPayload::new("test").with_arg("op", name)
    }

    fn running_tags(request: &Request) -> Vec<String> {
        request.detail().running.into_iter().map(|o| o.tag).collect()
    }

    #[test]
    fn test_empty_pipeline_is_finished() {
        let interface = Arc::new(RecordingInterface::new());
        let request = Request::launch(Vec::new(), executor(&interface));

        assert!(request.is_finished());
        assert!(!request.is_ready());
        assert_eq!(request.status(), RequestStatus::Success);
        assert!(interface.submitted().is_empty());
    }

    #[test]
    fn test_new_request_dispatches_nothing() {
        let interface = Arc::new(RecordingInterface::new());
        let request = Request::new(vec![vec![op("A")]], executor(&interface));

        assert!(request.is_ready());
        assert!(interface.submitted().is_empty());
        assert_eq!(request.advance(), 1);
        assert_eq!(interface.submitted().len(), 1);
    }

    #[test]
    fn test_unique_ids() {
        let interface = Arc::new(RecordingInterface::new());
        let a = Request::new(Vec::new(), executor(&interface));
        let b = Request::new(Vec::new(), executor(&interface));
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn test_staged_scenario() {
        let interface = Arc::new(RecordingInterface::new());
        let request = Request::launch(
            vec![vec![op("A")], vec![op("B"), op("C")]],
            executor(&interface),
        );
        let id = request.id().to_string();

        assert_eq!(running_tags(&request), vec![format!("{id}:0:0")]);
        assert!(request.is_waiting());
        assert_eq!(request.detail().waiting, vec![vec!["test op=B", "test op=C"]]);

        assert!(request.complete(CompletionEvent::new(format!("{id}:0:0"), 0)));
        assert!(request.is_ready());
        assert_eq!(request.advance(), 1);

        assert_eq!(
            running_tags(&request),
            vec![format!("{id}:1:0"), format!("{id}:1:1")]
        );
        assert!(!request.is_waiting());

        assert!(request.complete(CompletionEvent::new(format!("{id}:1:0"), 0)));
        assert_eq!(request.status(), RequestStatus::Pending);
        assert!(request.complete(CompletionEvent::new(format!("{id}:1:1"), 1).with_outs("EINVAL")));

        let detail = request.detail();
        let finished: Vec<String> = detail.finished.iter().map(|o| o.command.clone()).collect();
        let failed: Vec<String> = detail.failed.iter().map(|o| o.command.clone()).collect();
        assert_eq!(finished, vec!["test op=A", "test op=B"]);
        assert_eq!(failed, vec!["test op=C"]);
        assert_eq!(detail.failed[0].outs, "EINVAL");
        assert_eq!(detail.status, RequestStatus::Failed);
        assert!(detail.is_finished && detail.has_failed && !detail.is_waiting);
    }

    #[test]
    fn test_second_completion_is_rejected() {
        let interface = Arc::new(RecordingInterface::new());
        let request = Request::launch(vec![vec![op("A"), op("B")]], executor(&interface));
        let tag = format!("{}:0:0", request.id());

        assert!(request.complete(CompletionEvent::new(tag.as_str(), 0)));
        assert!(!request.complete(CompletionEvent::new(tag.as_str(), 1)));

        let detail = request.detail();
        assert_eq!(detail.finished.len(), 1);
        assert!(detail.failed.is_empty());
        assert_eq!(detail.running.len(), 1);
    }

    #[test]
    fn test_stale_tag_does_not_hit_later_stage() {
        let interface = Arc::new(RecordingInterface::new());
        let request = Request::launch(vec![vec![op("A")], vec![op("B")]], executor(&interface));
        let first = format!("{}:0:0", request.id());

        assert!(request.complete(CompletionEvent::new(first.as_str(), 0)));
        request.advance();
        assert!(!request.complete(CompletionEvent::new(first.as_str(), 0)));
        assert!(request.is_running(&format!("{}:1:0", request.id())));
    }

    #[test]
    fn test_failure_does_not_halt_later_stages() {
        let interface = Arc::new(RecordingInterface::new());
        let request = Request::launch(vec![vec![op("A")], vec![op("B")]], executor(&interface));

        assert!(request.complete(CompletionEvent::new(format!("{}:0:0", request.id()), 22)));
        assert_eq!(request.advance(), 1);
        assert!(request.complete(CompletionEvent::new(format!("{}:1:0", request.id()), 0)));

        assert!(request.is_finished());
        assert!(request.has_failed());
        assert_eq!(request.status(), RequestStatus::Failed);
    }

    #[test]
    fn test_empty_stages_are_drained() {
        let interface = Arc::new(RecordingInterface::new());
        let request = Request::launch(vec![vec![], vec![], vec![op("C")]], executor(&interface));

        assert_eq!(running_tags(&request), vec![format!("{}:2:0", request.id())]);
        assert!(!request.is_waiting());
    }

    #[test]
    fn test_refused_stage_keeps_request_live() {
        let interface = Arc::new(RecordingInterface::rejecting(["test op=A"]));
        let request = Request::launch(vec![vec![op("A")], vec![op("B")]], executor(&interface));

        let detail = request.detail();
        assert_eq!(detail.failed.len(), 1);
        assert_eq!(detail.running.len(), 1);
        assert_eq!(detail.running[0].command, "test op=B");
    }

    #[test]
    fn test_advance_noop_while_running() {
        let interface = Arc::new(RecordingInterface::new());
        let request = Request::launch(vec![vec![op("A")], vec![op("B")]], executor(&interface));

        assert_eq!(request.advance(), 0);
        assert_eq!(interface.submitted().len(), 1);
    }

    #[test]
    fn test_concurrent_completions_advance_once() {
        let interface = Arc::new(RecordingInterface::new());
        let stage: Vec<CommandPayload> = (0..16).map(|i| op(&i.to_string())).collect();
        let request = Request::launch(vec![stage, vec![op("last")]], executor(&interface));

        let handles: Vec<_> = (0..16)
            .map(|i| {
                let request = request.clone();
                std::thread::spawn(move || {
                    let tag = format!("{}:0:{}", request.id(), i);
                    assert!(request.complete(CompletionEvent::new(tag, 0)));
                    if request.is_ready() {
                        request.advance();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(interface.submitted().len(), 17);
        assert_eq!(running_tags(&request), vec![format!("{}:1:0", request.id())]);
    }

    #[test]
    fn test_dropped_refusals_fail_the_request() {
        let interface = Arc::new(RecordingInterface::rejecting(["A", "B"]));
        let config = OrchestratorConfig::default().with_dispatch_failure(DispatchFailurePolicy::Drop);
        let executor = Arc::new(StageExecutor::new(
            CommandDispatcher::new(interface.clone()),
            &config,
        ));

        let request = Request::launch(
            vec![vec![CommandPayload::new("A")], vec![CommandPayload::new("B")]],
            executor,
        );

        assert!(request.is_finished());
        assert!(request.has_failed());
        assert_eq!(request.status(), RequestStatus::Failed);

        let detail = request.detail();
        let id = request.id();
        assert!(detail.finished.is_empty() && detail.failed.is_empty());
        assert_eq!(detail.dropped, vec![format!("{id}:0:0"), format!("{id}:1:0")]);
        assert!(detail.has_failed);
        assert_eq!(interface.rejected().len(), 2);
    }
}
