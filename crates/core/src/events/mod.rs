//! Status events relayed from the pollers to observers.
//!
//! Pollers hold an [`EventHandle`] and never wait on delivery; an
//! [`EventDispatcher`] task drains the channel and fans events out to the
//! registered [`StatusObserver`]s.

mod dispatcher;
mod events;
mod handle;

pub use dispatcher::*;
pub use events::*;
pub use handle::*;
