//! Testing utilities for cmdflow hosts.
//!
//! This module provides command interface doubles that record what the
//! orchestrator dispatches, so tests can deliver completions by hand.

mod interfaces;

pub use interfaces::RecordingInterface;
