//! Completion notifier: routes completion events to their request.

use tracing::{debug, warn};

use super::RequestRegistry;
use crate::core::CompletionEvent;
use crate::errors::NotifyError;

impl RequestRegistry {
    /// Applies a completion event and advances the owning request.
    ///
    /// Returns the owning request's identifier. Events whose tag is running
    /// in no request, or in more than one, are logged and dropped; neither
    /// case mutates any request.
    pub fn notify(&self, event: CompletionEvent) -> Result<String, NotifyError> {
        let tag = event.tag.clone();
        let mut owners: Vec<_> = self
            .snapshot()
            .into_iter()
            .filter(|r| r.is_running(tag.as_str()))
            .collect();

        if owners.len() > 1 {
            let ids: Vec<String> = owners.iter().map(|r| r.id().to_string()).collect();
            warn!(tag = %tag, owners = ?ids, "Tag running in multiple requests, dropping completion");
            return Err(NotifyError::AmbiguousTag {
                tag: tag.to_string(),
                owners: ids,
            });
        }

        let Some(request) = owners.pop() else {
            warn!(tag = %tag, "Unknown request for completion, dropping");
            return Err(NotifyError::UnknownTag(tag.to_string()));
        };

        let code = event.code;
        if !request.complete(event) {
            // Consumed by a concurrent delivery of the same tag.
            warn!(tag = %tag, request_id = %request.id(), "Completion already consumed, dropping");
            return Err(NotifyError::UnknownTag(tag.to_string()));
        }
        debug!(tag = %tag, request_id = %request.id(), code, "Recorded completion");

        if request.is_ready() {
            request.advance();
        }
        Ok(request.id().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OrchestratorConfig;
    use crate::core::{CommandPayload, CommandTag, RequestStatus};
    use crate::dispatch::{CommandDispatcher, StageExecutor};
    use crate::request::Request;
    use crate::testing::RecordingInterface;
    use std::sync::Arc;

    fn setup() -> (Arc<RequestRegistry>, Arc<RecordingInterface>) {
        let interface = Arc::new(RecordingInterface::new());
        let executor = StageExecutor::new(
            CommandDispatcher::new(interface.clone()),
            &OrchestratorConfig::default(),
        );
        (Arc::new(RequestRegistry::new(Arc::new(executor))), interface)
    }

    fn op(name: &str) -> CommandPayload {
        CommandPayload::new(name)
    }

    fn complete(registry: &RequestRegistry, interface: &RecordingInterface, name: &str, code: i32) {
        let event = interface.completion_for(name, code).unwrap();
        registry.notify(event).unwrap();
    }

    #[test]
    fn test_unknown_tag_is_dropped() {
        let (registry, _) = setup();
        let id = registry.submit(vec![vec![op("A")]]);
        let before = registry.get(&id).unwrap().detail();

        let err = registry.notify(CompletionEvent::new("nope:0:0", 0)).unwrap_err();

        assert_eq!(err, NotifyError::UnknownTag("nope:0:0".to_string()));
        assert_eq!(registry.get(&id).unwrap().detail(), before);
    }

    #[test]
    fn test_duplicate_completion_is_noop() {
        let (registry, interface) = setup();
        let id = registry.submit(vec![vec![op("A"), op("B")]]);
        let event = interface.completion_for("A", 0).unwrap();

        assert_eq!(registry.notify(event.clone()).unwrap(), id);
        assert!(registry.notify(event.with_outs("late")).is_err());

        let detail = registry.get(&id).unwrap().detail();
        assert_eq!(detail.finished.len(), 1);
        assert_eq!(detail.finished[0].outs, "");
        assert_eq!(detail.running.len(), 1);
    }

    #[test]
    fn test_stage_waits_for_every_command() {
        let (registry, interface) = setup();
        registry.submit(vec![vec![op("a"), op("b")], vec![op("c")]]);

        complete(&registry, &interface, "b", 0);
        assert!(interface.tag_for("c").is_none());

        complete(&registry, &interface, "a", 0);
        assert!(interface.tag_for("c").is_some());
    }

    #[test]
    fn test_pipeline_scenario() {
        let (registry, interface) = setup();
        let pipeline = vec![
            vec![CommandPayload::new("run").with_arg("op", "A")],
            vec![
                CommandPayload::new("run").with_arg("op", "B"),
                CommandPayload::new("run").with_arg("op", "C"),
            ],
        ];
        let id = registry.submit(pipeline);
        let request = registry.get(&id).unwrap();

        let detail = request.detail();
        assert_eq!(detail.running.len(), 1);
        assert_eq!(detail.waiting, vec![vec!["run op=B", "run op=C"]]);

        complete(&registry, &interface, "run op=A", 0);
        let detail = request.detail();
        assert_eq!(detail.running.len(), 2);
        assert!(detail.waiting.is_empty());

        complete(&registry, &interface, "run op=B", 0);
        complete(&registry, &interface, "run op=C", 1);

        let detail = request.detail();
        let names = |views: &[crate::request::OutcomeView]| -> Vec<String> {
            views.iter().map(|v| v.command.clone()).collect()
        };
        assert_eq!(names(&detail.finished), vec!["run op=A", "run op=B"]);
        assert_eq!(names(&detail.failed), vec!["run op=C"]);
        assert_eq!(detail.status, RequestStatus::Failed);
    }

    #[test]
    fn test_ambiguous_tag_is_dropped() {
        let (registry, interface) = setup();
        let executor = Arc::new(StageExecutor::new(
            CommandDispatcher::new(interface.clone()),
            &OrchestratorConfig::default(),
        ));

        // Two requests whose running commands collide on a tag can only be
        // assembled by hand; submission always yields distinct tags.
        let first = Request::launch(vec![vec![op("A")]], executor.clone());
        let second = Request::launch(vec![vec![op("A")]], executor);
        let shared: CommandTag = interface.tags()[0].clone();
        assert!(first.is_running(shared.as_str()));
        registry.requests.write().push(first.clone());
        registry.requests.write().push(first.clone());
        registry.requests.write().push(second);

        let err = registry.notify(CompletionEvent::new(shared, 0)).unwrap_err();
        assert!(matches!(err, NotifyError::AmbiguousTag { ref owners, .. } if owners.len() == 2));
        assert!(!first.is_finished());
    }

    #[test]
    fn test_concurrent_notifications() {
        let (registry, interface) = setup();
        let ids: Vec<String> = (0..4)
            .map(|r| {
                registry.submit(vec![
                    (0..8).map(|c| op(&format!("r{r}-s0-c{c}"))).collect(),
                    (0..8).map(|c| op(&format!("r{r}-s1-c{c}"))).collect(),
                ])
            })
            .collect();

        for stage in 0..2 {
            let events: Vec<CompletionEvent> = (0..4)
                .flat_map(|r| (0..8).map(move |c| (r, c)))
                .map(|(r, c)| {
                    interface
                        .completion_for(&format!("r{r}-s{stage}-c{c}"), 0)
                        .unwrap()
                })
                .collect();

            let handles: Vec<_> = events
                .into_iter()
                .map(|event| {
                    let registry = registry.clone();
                    std::thread::spawn(move || registry.notify(event))
                })
                .collect();
            for handle in handles {
                assert!(handle.join().unwrap().is_ok());
            }
        }

        for id in ids {
            assert_eq!(registry.get(&id).unwrap().status(), RequestStatus::Success);
        }
        assert_eq!(interface.submitted().len(), 64);
    }
}
