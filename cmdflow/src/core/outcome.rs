//! Correlation tags, command outcomes, and completion events.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque string correlating a dispatched command with its completion event.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommandTag(String);

impl CommandTag {
    /// Builds the tag for the command at `index` under `prefix`.
    #[must_use]
    pub fn indexed(prefix: &str, index: usize) -> Self {
        Self(format!("{prefix}:{index}"))
    }

    /// Returns the tag as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CommandTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CommandTag {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for CommandTag {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl PartialEq<str> for CommandTag {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

/// Completion event delivered by the administrative interface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionEvent {
    /// Tag of the command that completed.
    pub tag: CommandTag,
    /// Result code; the configured success code means success.
    pub code: i32,
    /// Status text.
    #[serde(default)]
    pub outs: String,
    /// Binary output.
    #[serde(default)]
    pub outb: Vec<u8>,
}

impl CompletionEvent {
    /// Creates an event without output.
    #[must_use]
    pub fn new(tag: impl Into<CommandTag>, code: i32) -> Self {
        Self {
            tag: tag.into(),
            code,
            outs: String::new(),
            outb: Vec::new(),
        }
    }

    /// Sets the status text.
    #[must_use]
    pub fn with_outs(mut self, outs: impl Into<String>) -> Self {
        self.outs = outs.into();
        self
    }

    /// Sets the binary output.
    #[must_use]
    pub fn with_outb(mut self, outb: impl Into<Vec<u8>>) -> Self {
        self.outb = outb.into();
        self
    }
}

/// The lifecycle record of one dispatched command.
///
/// An outcome is pending until its completion is recorded, which happens
/// exactly once; it is immutable afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutcome {
    tag: CommandTag,
    description: String,
    code: Option<i32>,
    outs: String,
    outb: Vec<u8>,
    dispatched_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
}

impl CommandOutcome {
    /// Creates a pending outcome for a freshly dispatched command.
    #[must_use]
    pub fn pending(tag: CommandTag, description: impl Into<String>) -> Self {
        Self {
            tag,
            description: description.into(),
            code: None,
            outs: String::new(),
            outb: Vec::new(),
            dispatched_at: Utc::now(),
            completed_at: None,
        }
    }

    /// Creates an outcome for a command the interface refused to accept.
    #[must_use]
    pub fn undispatched(
        tag: CommandTag,
        description: impl Into<String>,
        code: i32,
        reason: impl Into<String>,
    ) -> Self {
        let mut outcome = Self::pending(tag, description);
        outcome.settle(code, reason.into(), Vec::new());
        outcome
    }

    fn settle(&mut self, code: i32, outs: String, outb: Vec<u8>) {
        self.code = Some(code);
        self.outs = outs;
        self.outb = outb;
        self.completed_at = Some(Utc::now());
    }

    /// Records the completion event. A completed outcome keeps its first result.
    pub(crate) fn record(&mut self, event: CompletionEvent) {
        if self.is_pending() {
            self.settle(event.code, event.outs, event.outb);
        }
    }

    /// The correlation tag.
    #[must_use]
    pub fn tag(&self) -> &CommandTag {
        &self.tag
    }

    /// Human-readable command description.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// The result code, absent while pending.
    #[must_use]
    pub fn code(&self) -> Option<i32> {
        self.code
    }

    /// Captured status text.
    #[must_use]
    pub fn outs(&self) -> &str {
        &self.outs
    }

    /// Captured binary output.
    #[must_use]
    pub fn outb(&self) -> &[u8] {
        &self.outb
    }

    /// When the command was handed to the interface.
    #[must_use]
    pub fn dispatched_at(&self) -> DateTime<Utc> {
        self.dispatched_at
    }

    /// When the completion was recorded.
    #[must_use]
    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    /// Returns true while no completion has been recorded.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.code.is_none()
    }

    /// Returns true if completed with `success_code`.
    #[must_use]
    pub fn succeeded(&self, success_code: i32) -> bool {
        self.code == Some(success_code)
    }
}
