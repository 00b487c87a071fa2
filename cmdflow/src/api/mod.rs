//! API surface over the orchestrator.
//!
//! Routes are declared once in [`ROUTES`]; a transport layer resolves a
//! method and path to an [`Operation`] and hands it to [`ApiHandler`].

mod handler;
mod routes;

pub use handler::ApiHandler;
pub use routes::{resolve, Method, Operation, Route, ROUTES};
