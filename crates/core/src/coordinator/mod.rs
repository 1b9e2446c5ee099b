//! Flow coordinator.
//!
//! Sequences the pollers against the single session: login first when the
//! session is not authenticated, then acquisition. At most one flow runs at a
//! time.

mod runner;
mod types;

pub use runner::Coordinator;
pub use types::{CoordinatorError, CoordinatorStatus, FlowOutcome, FlowResult, FlowStatus};
