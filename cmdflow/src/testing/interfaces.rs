//! Command interface doubles.

use parking_lot::Mutex;
use std::collections::HashSet;

use crate::core::{CommandPayload, CommandTag, CompletionEvent};
use crate::dispatch::CommandInterface;
use crate::errors::DispatchError;

/// An interface that records every command it accepts.
///
/// Optionally refuses commands whose rendered description matches one of a
/// configured set.
#[derive(Debug, Default)]
pub struct RecordingInterface {
    submitted: Mutex<Vec<(CommandPayload, CommandTag)>>,
    rejected: Mutex<Vec<CommandTag>>,
    refuse: HashSet<String>,
}

impl RecordingInterface {
    /// Creates an interface that accepts everything.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an interface that refuses the given command descriptions.
    #[must_use]
    pub fn rejecting<'a>(descriptions: impl IntoIterator<Item = &'a str>) -> Self {
        Self {
            refuse: descriptions.into_iter().map(String::from).collect(),
            ..Self::default()
        }
    }

    /// Accepted commands, in dispatch order.
    #[must_use]
    pub fn submitted(&self) -> Vec<(CommandPayload, CommandTag)> {
        self.submitted.lock().clone()
    }

    /// Tags of accepted commands, in dispatch order.
    #[must_use]
    pub fn tags(&self) -> Vec<CommandTag> {
        self.submitted.lock().iter().map(|(_, tag)| tag.clone()).collect()
    }

    /// Descriptions of accepted commands, in dispatch order.
    #[must_use]
    pub fn descriptions(&self) -> Vec<String> {
        self.submitted
            .lock()
            .iter()
            .map(|(payload, _)| payload.describe())
            .collect()
    }

    /// Tags of refused commands.
    #[must_use]
    pub fn rejected(&self) -> Vec<CommandTag> {
        self.rejected.lock().clone()
    }

    /// Finds the tag of the accepted command with the given description.
    #[must_use]
    pub fn tag_for(&self, description: &str) -> Option<CommandTag> {
        self.submitted
            .lock()
            .iter()
            .find(|(payload, _)| payload.describe() == description)
            .map(|(_, tag)| tag.clone())
    }

    /// Builds a completion event for the command with the given description.
    #[must_use]
    pub fn completion_for(&self, description: &str, code: i32) -> Option<CompletionEvent> {
        self.tag_for(description).map(|tag| CompletionEvent::new(tag, code))
    }
}

impl CommandInterface for RecordingInterface {
    fn submit_command(&self, payload: &CommandPayload, tag: &CommandTag) -> Result<(), DispatchError> {
        if self.refuse.contains(&payload.describe()) {
            self.rejected.lock().push(tag.clone());
            return Err(DispatchError::rejected(tag.as_str(), "refused by test interface"));
        }
        self.submitted.lock().push((payload.clone(), tag.clone()));
        Ok(())
    }
}
