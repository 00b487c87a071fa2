//! Serializable read model of a request.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::{CommandOutcome, RequestStatus};

/// One outcome as shown to pollers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutcomeView {
    /// Correlation tag.
    pub tag: String,
    /// Human-readable command.
    pub command: String,
    /// Result code, absent while running.
    pub code: Option<i32>,
    /// Status text.
    pub outs: String,
    /// Binary output, base64-encoded when serialized.
    #[serde(with = "base64_bytes")]
    pub outb: Vec<u8>,
    /// When the command was dispatched.
    pub dispatched_at: DateTime<Utc>,
    /// When it completed.
    pub completed_at: Option<DateTime<Utc>>,
}

impl From<&CommandOutcome> for OutcomeView {
    fn from(outcome: &CommandOutcome) -> Self {
        Self {
            tag: outcome.tag().to_string(),
            command: outcome.description().to_string(),
            code: outcome.code(),
            outs: outcome.outs().to_string(),
            outb: outcome.outb().to_vec(),
            dispatched_at: outcome.dispatched_at(),
            completed_at: outcome.completed_at(),
        }
    }
}

mod base64_bytes {
    use base64::{engine::general_purpose::STANDARD, Engine};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<u8>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        STANDARD.decode(s).map_err(serde::de::Error::custom)
    }
}

/// Snapshot of a request taken under its lock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestDetail {
    /// Request identifier.
    pub uuid: String,
    /// Aggregate status.
    pub status: RequestStatus,
    /// When the request was submitted.
    pub created_at: DateTime<Utc>,
    /// Dispatched, not yet completed.
    pub running: Vec<OutcomeView>,
    /// Completed with the success code.
    pub finished: Vec<OutcomeView>,
    /// Descriptions of the commands in each stage not yet dispatched.
    pub waiting: Vec<Vec<String>>,
    /// Completed with any other code.
    pub failed: Vec<OutcomeView>,
    /// Tags of refused commands dropped without an outcome.
    #[serde(default)]
    pub dropped: Vec<String>,
    /// Stages are waiting.
    pub is_waiting: bool,
    /// Nothing is waiting or running.
    pub is_finished: bool,
    /// At least one command failed or was dropped.
    pub has_failed: bool,
}
