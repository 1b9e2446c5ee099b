use std::sync::Arc;

use tokio::sync::mpsc;

use super::{EventCategory, EventHandle, StatusEvent};

/// Receiver of status events.
///
/// Called from the dispatcher task, never from a poller, so implementations
/// may take their time without stalling polling.
pub trait StatusObserver: Send + Sync {
    fn on_status(&self, event: &StatusEvent);
}

impl<F> StatusObserver for F
where
    F: Fn(&StatusEvent) + Send + Sync,
{
    fn on_status(&self, event: &StatusEvent) {
        self(event)
    }
}

/// Observer that mirrors status events into the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogObserver;

impl StatusObserver for LogObserver {
    fn on_status(&self, event: &StatusEvent) {
        match event.category {
            EventCategory::Failure => tracing::warn!("{}", event.message),
            _ => tracing::info!("{}", event.message),
        }
    }
}

/// Background task that receives status events and hands them to observers
pub struct EventDispatcher {
    rx: mpsc::UnboundedReceiver<StatusEvent>,
    observers: Vec<Arc<dyn StatusObserver>>,
}

impl EventDispatcher {
    pub fn new(rx: mpsc::UnboundedReceiver<StatusEvent>) -> Self {
        Self {
            rx,
            observers: Vec::new(),
        }
    }

    pub fn with_observer(mut self, observer: Arc<dyn StatusObserver>) -> Self {
        self.observers.push(observer);
        self
    }

    /// Run the dispatcher, consuming events until every handle is dropped
    ///
    /// This should be spawned as a background task.
    pub async fn run(mut self) {
        tracing::info!(
            "Event dispatcher started with {} observers",
            self.observers.len()
        );

        while let Some(event) = self.rx.recv().await {
            crate::metrics::STATUS_EVENTS
                .with_label_values(&[event.event.event_type()])
                .inc();
            for observer in &self.observers {
                observer.on_status(&event);
            }
        }

        tracing::info!("Event dispatcher shutting down");
    }
}

/// Create the event pipeline
///
/// Returns:
/// - `EventHandle` - for emitting events (clone this to share across tasks)
/// - `EventDispatcher` - register observers, then spawn with `tokio::spawn(dispatcher.run())`
pub fn create_event_channel() -> (EventHandle, EventDispatcher) {
    let (tx, rx) = mpsc::unbounded_channel();
    (EventHandle::new(tx), EventDispatcher::new(rx))
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::events::PollerEvent;

    #[derive(Default)]
    struct Recorder {
        seen: Mutex<Vec<StatusEvent>>,
    }

    impl StatusObserver for Recorder {
        fn on_status(&self, event: &StatusEvent) {
            self.seen.lock().unwrap().push(event.clone());
        }
    }

    #[tokio::test]
    async fn test_dispatcher_delivers_to_every_observer() {
        let first = Arc::new(Recorder::default());
        let second = Arc::new(Recorder::default());
        let (handle, dispatcher) = create_event_channel();
        let dispatcher = dispatcher
            .with_observer(first.clone())
            .with_observer(second.clone());

        let task = tokio::spawn(dispatcher.run());

        handle.emit(PollerEvent::Authenticated);
        handle.emit(PollerEvent::PurchaseCancelled);
        drop(handle);
        task.await.unwrap();

        for recorder in [&first, &second] {
            let seen = recorder.seen.lock().unwrap();
            assert_eq!(seen.len(), 2);
            assert_eq!(seen[0].event, PollerEvent::Authenticated);
            assert_eq!(seen[1].event, PollerEvent::PurchaseCancelled);
        }
    }

    #[tokio::test]
    async fn test_closure_observer() {
        let count = Arc::new(Mutex::new(0));
        let counter = count.clone();
        let (handle, dispatcher) = create_event_channel();
        let dispatcher = dispatcher.with_observer(Arc::new(move |_: &StatusEvent| {
            *counter.lock().unwrap() += 1;
        }));

        let task = tokio::spawn(dispatcher.run());
        handle.emit(PollerEvent::LoginInvalid);
        drop(handle);
        task.await.unwrap();

        assert_eq!(*count.lock().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_dispatcher_stops_when_handles_dropped() {
        let (handle, dispatcher) = create_event_channel();
        let task = tokio::spawn(dispatcher.with_observer(Arc::new(LogObserver)).run());

        let clone = handle.clone();
        drop(handle);
        clone.emit(PollerEvent::LoginCancelled);
        drop(clone);

        task.await.unwrap();
    }
}
