//! Command dispatcher and stage executor.

use std::sync::Arc;
use tracing::{debug, warn};

use super::CommandInterface;
use crate::config::{DispatchFailurePolicy, OrchestratorConfig};
use crate::core::{CommandOutcome, CommandPayload, CommandTag};
use crate::errors::DispatchError;

/// Sends single commands to the administrative interface.
#[derive(Clone)]
pub struct CommandDispatcher {
    interface: Arc<dyn CommandInterface>,
}

impl CommandDispatcher {
    /// Creates a dispatcher over the given interface.
    #[must_use]
    pub fn new(interface: Arc<dyn CommandInterface>) -> Self {
        Self { interface }
    }

    /// Dispatches one command and returns its pending outcome.
    ///
    /// On error no outcome exists for the tag.
    pub fn dispatch(
        &self,
        payload: &CommandPayload,
        tag: CommandTag,
    ) -> Result<CommandOutcome, DispatchError> {
        let description = payload.describe();
        self.interface.submit_command(payload, &tag)?;
        debug!(tag = %tag, command = %description, "Dispatched command");
        Ok(CommandOutcome::pending(tag, description))
    }
}

impl std::fmt::Debug for CommandDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandDispatcher").finish_non_exhaustive()
    }
}

/// Dispatches every command of a stage, tolerating partial failure.
#[derive(Debug, Clone)]
pub struct StageExecutor {
    dispatcher: CommandDispatcher,
    policy: DispatchFailurePolicy,
    failure_code: i32,
    success_code: i32,
}

impl StageExecutor {
    /// Creates an executor using the dispatch settings from `config`.
    #[must_use]
    pub fn new(dispatcher: CommandDispatcher, config: &OrchestratorConfig) -> Self {
        Self {
            dispatcher,
            policy: config.dispatch_failure,
            failure_code: config.dispatch_failure_code,
            success_code: config.success_code,
        }
    }

    /// The result code that counts as success.
    #[must_use]
    pub fn success_code(&self) -> i32 {
        self.success_code
    }

    /// Dispatches `commands`, tagging the command at index `i` as `{prefix}:{i}`.
    ///
    /// A refused command never prevents dispatch of the others. Depending on
    /// the policy it either yields an already-failed outcome or only its tag
    /// in [`StageDispatch::dropped`].
    pub fn run_stage(&self, commands: &[CommandPayload], prefix: &str) -> StageDispatch {
        let mut result = StageDispatch {
            outcomes: Vec::with_capacity(commands.len()),
            dropped: Vec::new(),
        };

        for (index, payload) in commands.iter().enumerate() {
            let tag = CommandTag::indexed(prefix, index);
            match self.dispatcher.dispatch(payload, tag.clone()) {
                Ok(outcome) => result.outcomes.push(outcome),
                Err(err) => {
                    warn!(tag = %tag, command = %payload, error = %err, "Failed to dispatch command");
                    match self.policy {
                        DispatchFailurePolicy::RecordFailed => {
                            result.outcomes.push(CommandOutcome::undispatched(
                                tag,
                                payload.describe(),
                                self.failure_code,
                                err.to_string(),
                            ));
                        }
                        DispatchFailurePolicy::Drop => result.dropped.push(tag),
                    }
                }
            }
        }

        result
    }
}

/// What dispatching one stage produced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StageDispatch {
    /// Outcomes in stage order.
    pub outcomes: Vec<CommandOutcome>,
    /// Tags of refused commands kept without an outcome.
    pub dropped: Vec<CommandTag>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::MockCommandInterface;
    use mockall::predicate::always;

    fn payloads(prefixes: &[&str]) -> Vec<CommandPayload> {
        prefixes.iter().map(|p| CommandPayload::new(*p)).collect()
    }

    #[test]
    fn test_dispatch_returns_pending_outcome() {
        let mut interface = MockCommandInterface::new();
        interface
            .expect_submit_command()
            .withf(|payload, tag| payload.prefix() == Some("osd set") && tag.as_str() == "r:0")
            .times(1)
            .returning(|_, _| Ok(()));

        let dispatcher = CommandDispatcher::new(Arc::new(interface));
        let outcome = dispatcher
            .dispatch(&CommandPayload::new("osd set").with_arg("key", "noout"), "r:0".into())
            .unwrap();

        assert!(outcome.is_pending());
        assert_eq!(outcome.description(), "osd set key=noout");
    }

    #[test]
    fn test_dispatch_error_propagates() {
        let mut interface = MockCommandInterface::new();
        interface
            .expect_submit_command()
            .with(always(), always())
            .returning(|_, tag| Err(DispatchError::rejected(tag.as_str(), "nope")));

        let dispatcher = CommandDispatcher::new(Arc::new(interface));
        assert!(dispatcher.dispatch(&CommandPayload::new("A"), "r:0".into()).is_err());
    }

    #[test]
    fn test_run_stage_tags_by_index() {
        let mut interface = MockCommandInterface::new();
        interface.expect_submit_command().times(3).returning(|_, _| Ok(()));

        let executor = StageExecutor::new(
            CommandDispatcher::new(Arc::new(interface)),
            &OrchestratorConfig::default(),
        );
        let outcomes = executor.run_stage(&payloads(&["A", "B", "C"]), "req:2").outcomes;

        let tags: Vec<&str> = outcomes.iter().map(|o| o.tag().as_str()).collect();
        assert_eq!(tags, vec!["req:2:0", "req:2:1", "req:2:2"]);
        assert!(outcomes.iter().all(CommandOutcome::is_pending));
    }

    #[test]
    fn test_run_stage_records_refused_commands() {
        let mut interface = MockCommandInterface::new();
        interface
            .expect_submit_command()
            .times(3)
            .returning(|payload, tag| {
                if payload.prefix() == Some("B") {
                    Err(DispatchError::rejected(tag.as_str(), "refused"))
                } else {
                    Ok(())
                }
            });

        let executor = StageExecutor::new(
            CommandDispatcher::new(Arc::new(interface)),
            &OrchestratorConfig::default(),
        );
        let stage = executor.run_stage(&payloads(&["A", "B", "C"]), "req:0");
        assert!(stage.dropped.is_empty());
        let outcomes = stage.outcomes;

        assert_eq!(outcomes.len(), 3);
        assert!(outcomes[0].is_pending());
        assert_eq!(outcomes[1].code(), Some(-5));
        assert!(outcomes[1].outs().contains("refused"));
        assert!(outcomes[2].is_pending());
    }

    #[test]
    fn test_run_stage_drop_policy_keeps_refused_tags() {
        let mut interface = MockCommandInterface::new();
        interface
            .expect_submit_command()
            .times(2)
            .returning(|payload, _| {
                if payload.prefix() == Some("A") {
                    Err(DispatchError::Unavailable("down".to_string()))
                } else {
                    Ok(())
                }
            });

        let config = OrchestratorConfig::default().with_dispatch_failure(DispatchFailurePolicy::Drop);
        let executor = StageExecutor::new(CommandDispatcher::new(Arc::new(interface)), &config);
        let stage = executor.run_stage(&payloads(&["A", "B"]), "req:0");

        assert_eq!(stage.outcomes.len(), 1);
        assert_eq!(stage.outcomes[0].tag().as_str(), "req:0:1");
        assert_eq!(stage.dropped, vec![CommandTag::from("req:0:0")]);
    }
}
