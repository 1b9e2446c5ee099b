//! Control server for snapcart: an HTTP and websocket surface over the
//! flow coordinator.

pub mod api;
pub mod metrics;
pub mod state;
