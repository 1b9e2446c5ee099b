//! Retail platform access.
//!
//! The core never talks to the platform directly: everything goes through the
//! [`Platform`] capability trait, which a real HTTP client or the offline
//! [`SimulatedPlatform`] implements.

mod simulated;
mod traits;
mod types;

pub use simulated::{SimulatedPlatform, SimulatedPlatformConfig};
pub use traits::{Platform, PlatformError};
pub use types::ItemDetail;
