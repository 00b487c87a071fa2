//! Error types for the cmdflow orchestrator.
//!
//! Nothing here is fatal: dispatch failures degrade to failed outcomes,
//! notification errors are logged and dropped, and caller-facing errors are
//! rendered as `{"error": ...}` by the API layer.

use std::collections::HashMap;
use thiserror::Error;

/// The main error type for cmdflow operations.
#[derive(Debug, Error)]
pub enum CmdflowError {
    /// A command could not be handed to the administrative interface.
    #[error("{0}")]
    Dispatch(#[from] DispatchError),

    /// No request with the given identifier is registered.
    #[error("Unknown request UUID \"{0}\"")]
    RequestNotFound(String),

    /// A caller supplied arguments that cannot be turned into commands.
    #[error("{0}")]
    InvalidArguments(String),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// A generic internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CmdflowError {
    /// Creates an invalid-arguments error.
    #[must_use]
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidArguments(message.into())
    }

    /// Returns a short machine-readable kind.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Dispatch(_) => "dispatch",
            Self::RequestNotFound(_) => "request_not_found",
            Self::InvalidArguments(_) => "invalid_arguments",
            Self::Serialization(_) => "serialization",
            Self::Internal(_) => "internal",
        }
    }

    /// Converts to a dictionary representation.
    #[must_use]
    pub fn to_dict(&self) -> HashMap<String, serde_json::Value> {
        let mut map = HashMap::new();
        map.insert("error".to_string(), serde_json::Value::String(self.to_string()));
        map.insert(
            "kind".to_string(),
            serde_json::Value::String(self.kind().to_string()),
        );
        map
    }
}

impl From<serde_json::Error> for CmdflowError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Error raised when the administrative interface refuses a command.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    /// The interface rejected this particular command.
    #[error("Command '{tag}' rejected: {reason}")]
    Rejected {
        /// The correlation tag of the rejected command.
        tag: String,
        /// Why it was rejected.
        reason: String,
    },

    /// The interface cannot accept commands at all.
    #[error("Command interface unavailable: {0}")]
    Unavailable(String),
}

impl DispatchError {
    /// Creates a rejection error.
    #[must_use]
    pub fn rejected(tag: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Rejected {
            tag: tag.into(),
            reason: reason.into(),
        }
    }
}

/// Error returned by the completion notifier when an event cannot be routed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NotifyError {
    /// No registered request is running a command with this tag.
    #[error("Unknown request '{0}'")]
    UnknownTag(String),

    /// More than one request claims the tag; the event is not applied.
    #[error("Tag '{tag}' is running in {} requests", .owners.len())]
    AmbiguousTag {
        /// The duplicated tag.
        tag: String,
        /// Identifiers of every request claiming it.
        owners: Vec<String>,
    },
}

impl NotifyError {
    /// Returns the tag the failed event carried.
    #[must_use]
    pub fn tag(&self) -> &str {
        match self {
            Self::UnknownTag(tag) | Self::AmbiguousTag { tag, .. } => tag,
        }
    }

    /// Converts to a dictionary representation.
    #[must_use]
    pub fn to_dict(&self) -> HashMap<String, serde_json::Value> {
        let mut map = HashMap::new();
        map.insert("error".to_string(), serde_json::Value::String(self.to_string()));
        map.insert("tag".to_string(), serde_json::Value::String(self.tag().to_string()));
        if let Self::AmbiguousTag { owners, .. } = self {
            map.insert(
                "owners".to_string(),
                serde_json::Value::Array(
                    owners
                        .iter()
                        .map(|o| serde_json::Value::String(o.clone()))
                        .collect(),
                ),
            );
        }
        map
    }
}
