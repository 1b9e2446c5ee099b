use tokio::sync::mpsc;

use super::{PollerEvent, StatusEvent};

/// Handle for emitting status events
///
/// This is cheaply cloneable and can be shared across tasks.
/// Events are queued on an unbounded channel, so emitting never blocks the
/// poller; the [`EventDispatcher`](super::EventDispatcher) delivers them.
#[derive(Debug, Clone)]
pub struct EventHandle {
    tx: mpsc::UnboundedSender<StatusEvent>,
}

impl EventHandle {
    /// Create a new event handle from a channel sender
    pub fn new(tx: mpsc::UnboundedSender<StatusEvent>) -> Self {
        Self { tx }
    }

    /// Stamp and queue an event.
    ///
    /// If the receiving side is gone the event is dropped and logged.
    pub fn emit(&self, event: PollerEvent) {
        let status = StatusEvent::new(event);
        tracing::debug!("Status event: {}", status.event.event_type());
        if let Err(e) = self.tx.send(status) {
            tracing::error!("Failed to emit status event: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventCategory;
    use chrono::Utc;

    #[test]
    fn test_emit_event() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let handle = EventHandle::new(tx);

        handle.emit(PollerEvent::Authenticated);

        let status = rx.try_recv().expect("Should receive event");
        assert_eq!(status.event, PollerEvent::Authenticated);
        assert_eq!(status.category, EventCategory::Success);
    }

    #[test]
    fn test_events_keep_emission_order() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let handle = EventHandle::new(tx);
        let other = handle.clone();

        handle.emit(PollerEvent::LoginCancelled);
        other.emit(PollerEvent::PurchaseCancelled);

        assert_eq!(rx.try_recv().unwrap().event, PollerEvent::LoginCancelled);
        assert_eq!(rx.try_recv().unwrap().event, PollerEvent::PurchaseCancelled);
    }

    #[test]
    fn test_emit_closed_channel() {
        let (tx, rx) = mpsc::unbounded_channel::<StatusEvent>();
        let handle = EventHandle::new(tx);
        drop(rx);

        // This should not panic, just log an error
        handle.emit(PollerEvent::Authenticated);
    }

    #[test]
    fn test_event_has_timestamp() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let handle = EventHandle::new(tx);

        let before = Utc::now();
        handle.emit(PollerEvent::LoginInvalid);
        let after = Utc::now();

        let status = rx.try_recv().expect("Should receive event");
        assert!(status.timestamp >= before);
        assert!(status.timestamp <= after);
    }
}
