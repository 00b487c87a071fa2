//! # Cmdflow
//!
//! Staged batch-command orchestration for cluster manager control planes.
//!
//! Callers submit a *pipeline*: an ordered list of stages, each a set of
//! administrative commands that run concurrently. Commands complete
//! out-of-band through tag-correlated completion events; a stage is
//! dispatched only once every command of the previous stage has completed.
//!
//! - **Requests**: per-pipeline state machine with pending/failed/success status
//! - **Registry**: concurrent collection with polling, cleanup and cancellation
//! - **Dispatch**: pluggable `CommandInterface`, partial-failure tolerant stages
//! - **API**: statically declared route table and command builders
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use cmdflow::prelude::*;
//!
//! let orchestrator = Arc::new(Orchestrator::new(interface, OrchestratorConfig::default()));
//!
//! let id = orchestrator.submit(vec![
//!     vec![CommandPayload::new("osd pool create").with_arg("pool", "rbd").with_arg("pg_num", 64)],
//!     vec![CommandPayload::new("osd pool set").with_arg("pool", "rbd").with_arg("var", "size").with_arg("val", 3)],
//! ]);
//!
//! // Later, from the interface's completion callback:
//! orchestrator.notify(CompletionEvent::new(tag, 0))?;
//! assert_eq!(orchestrator.get(&id)?.status, RequestStatus::Success);
//! ```

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    missing_docs,
    rust_2018_idioms
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

pub mod api;
pub mod commands;
pub mod config;
pub mod core;
pub mod dispatch;
pub mod errors;
pub mod observability;
pub mod orchestrator;
pub mod registry;
pub mod request;
pub mod testing;


/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::api::{ApiHandler, Method, Operation};
    pub use crate::config::{DispatchFailurePolicy, LoggingConfig, OrchestratorConfig};
    pub use crate::core::{
        CommandOutcome, CommandPayload, CommandTag, CompletionEvent, Pipeline, RequestStatus,
        Stage,
    };
    pub use crate::dispatch::{ChannelInterface, CommandInterface, DispatchedCommand};
    pub use crate::errors::{CmdflowError, DispatchError, NotifyError};
    pub use crate::observability::init_logging;
    pub use crate::orchestrator::Orchestrator;
    pub use crate::registry::RequestRegistry;
    pub use crate::request::{Request, RequestDetail};
}
