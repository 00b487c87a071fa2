//! Dispatching commands to the administrative interface.
//!
//! This module provides:
//! - The `CommandInterface` trait the host implements
//! - A channel-backed interface for async command consumers
//! - The per-command dispatcher and per-stage executor

mod executor;
mod interface;

pub use executor::{CommandDispatcher, StageDispatch, StageExecutor};
#[cfg(test)]
pub use interface::MockCommandInterface;
pub use interface::{ChannelInterface, CommandInterface, DispatchedCommand};
