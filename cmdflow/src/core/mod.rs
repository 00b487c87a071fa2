//! Core types for batch-command orchestration.
//!
//! This module contains the fundamental types:
//! - `CommandPayload`, `Stage`, `Pipeline` - what callers submit
//! - `CommandTag`, `CommandOutcome`, `CompletionEvent` - per-command lifecycle
//! - `RequestStatus` - aggregate request state

mod outcome;
mod payload;
mod status;

pub use outcome::{CommandOutcome, CommandTag, CompletionEvent};
pub use payload::{pipeline_from_value, CommandPayload, Pipeline, Stage};
pub use status::RequestStatus;
