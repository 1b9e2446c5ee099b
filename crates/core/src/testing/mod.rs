//! Testing utilities and mock implementations.
//!
//! Mocks for the external collaborators of the core, so flows can be driven
//! end to end without a real platform.
//!
//! # Example
//!
//! ```rust,ignore
//! use snapcart_core::testing::{event_channel, collect_events, MockPlatform};
//!
//! let platform = Arc::new(MockPlatform::new());
//! platform.set_ticket_after(1);
//! let (events, mut rx) = event_channel();
//!
//! // Run a poller...
//!
//! assert_eq!(collect_events(&mut rx), vec![PollerEvent::Authenticated]);
//! ```

mod mock_platform;
mod mock_settings;

pub use mock_platform::{MockPlatform, PlatformCall, MOCK_TICKET};
pub use mock_settings::MockSettingsStore;

use tokio::sync::mpsc;

use crate::events::{EventHandle, PollerEvent, StatusEvent};

/// Event handle whose events land in the returned receiver.
pub fn event_channel() -> (EventHandle, mpsc::UnboundedReceiver<StatusEvent>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (EventHandle::new(tx), rx)
}

/// Drain every event queued so far.
pub fn collect_events(rx: &mut mpsc::UnboundedReceiver<StatusEvent>) -> Vec<PollerEvent> {
    let mut events = Vec::new();
    while let Ok(status) = rx.try_recv() {
        events.push(status.event);
    }
    events
}

/// Test fixtures and helper functions.
pub mod fixtures {
    use crate::poller::TaskParameters;
    use crate::settings::Settings;

    pub const ITEM_ID: &str = "100012043978";
    pub const AREA_ID: &str = "1_2901_55549";

    /// Task for two units, checked every 3 seconds.
    pub fn task_parameters() -> TaskParameters {
        TaskParameters::new(ITEM_ID, AREA_ID, 2, 3)
    }

    /// Settings matching [`task_parameters`], with a payment password.
    pub fn settings() -> Settings {
        Settings {
            item_id: ITEM_ID.to_string(),
            area_id: AREA_ID.to_string(),
            count: 2,
            poll_interval_secs: 3,
            payment_password: Some("123456".to_string()),
        }
    }
}
