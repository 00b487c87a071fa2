//! The administrative command interface the orchestrator dispatches into.

use tokio::sync::mpsc;

use crate::core::{CommandPayload, CommandTag};
use crate::errors::DispatchError;

/// Trait for the external administrative interface.
///
/// A successful `submit_command` guarantees that exactly one completion
/// event carrying `tag` is later delivered to the orchestrator. Completions
/// must be delivered from another thread or task, never from inside
/// `submit_command` itself: dispatch runs under the owning request's lock.
#[cfg_attr(test, mockall::automock)]
pub trait CommandInterface: Send + Sync {
    /// Hands a command to the interface. Fire-and-forget.
    fn submit_command(&self, payload: &CommandPayload, tag: &CommandTag) -> Result<(), DispatchError>;
}

/// A command as it travels through a [`ChannelInterface`].
#[derive(Debug, Clone, PartialEq)]
pub struct DispatchedCommand {
    /// The command payload.
    pub payload: CommandPayload,
    /// Its correlation tag.
    pub tag: CommandTag,
}

/// Interface that forwards commands to an async consumer over a bounded
/// tokio channel.
///
/// The consumer owns execution and reports back through the orchestrator's
/// completion channel.
#[derive(Debug, Clone)]
pub struct ChannelInterface {
    sender: mpsc::Sender<DispatchedCommand>,
}

impl ChannelInterface {
    /// Creates an interface and the receiver its commands arrive on.
    #[must_use]
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<DispatchedCommand>) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        (Self { sender }, receiver)
    }
}

impl CommandInterface for ChannelInterface {
    fn submit_command(&self, payload: &CommandPayload, tag: &CommandTag) -> Result<(), DispatchError> {
        self.sender
            .try_send(DispatchedCommand {
                payload: payload.clone(),
                tag: tag.clone(),
            })
            .map_err(|err| match err {
                mpsc::error::TrySendError::Full(_) => {
                    DispatchError::rejected(tag.as_str(), "command queue is full")
                }
                mpsc::error::TrySendError::Closed(_) => {
                    DispatchError::Unavailable("command consumer has shut down".to_string())
                }
            })
    }
}
