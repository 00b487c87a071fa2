//! Request status enum.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The aggregate status of a request, as reported to pollers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    /// Some stage is still waiting or running.
    Pending,
    /// Every stage drained and at least one command failed.
    Failed,
    /// Every stage drained and every command succeeded.
    Success,
}

impl Default for RequestStatus {
    fn default() -> Self {
        Self::Pending
    }
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Failed => write!(f, "failed"),
            Self::Success => write!(f, "success"),
        }
    }
}

impl RequestStatus {
    /// Derives the status from the drained/failed flags of a request.
    #[must_use]
    pub fn from_flags(is_finished: bool, has_failed: bool) -> Self {
        if !is_finished {
            Self::Pending
        } else if has_failed {
            Self::Failed
        } else {
            Self::Success
        }
    }

    /// Returns true if the status represents a terminal state.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Failed | Self::Success)
    }
}
