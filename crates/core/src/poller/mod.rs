//! Polling workers.
//!
//! Both workers are built on [`poll_until`], a bounded poll-with-interval
//! primitive:
//! - **AuthPoller**: waits for the QR ticket, validates it, marks the session
//!   authenticated.
//! - **AcquisitionPoller**: waits for stock, then clears the cart, adds the
//!   item and submits the order with a bounded retry burst.

mod acquisition;
mod auth;
mod config;
mod retry;
mod types;

pub use acquisition::AcquisitionPoller;
pub use auth::AuthPoller;
pub use config::PollerConfig;
pub use retry::{poll_until, PollOutcome, PollPolicy};
pub use types::{
    AcquisitionOutcome, AuthOutcome, InvalidParameters, PollerKind, PollerState, TaskParameters,
    MAX_COUNT, MAX_POLL_INTERVAL_SECS,
};
