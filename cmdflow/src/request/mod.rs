//! Request lifecycle: one pipeline's live execution state.

mod detail;
mod state;

pub use detail::{OutcomeView, RequestDetail};
pub use state::Request;
