//! Flow lifecycle integration tests.
//!
//! These tests drive complete flows through the coordinator against the mock
//! platform:
//! login -> acquisition -> purchased / cancelled

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::mpsc::UnboundedReceiver;

use snapcart_core::{
    create_event_channel,
    testing::{
        collect_events, event_channel, fixtures, MockPlatform, MockSettingsStore, PlatformCall,
    },
    AcquisitionOutcome, AuthOutcome, AuthPoller, Coordinator, CoordinatorError, EventCategory,
    FlowOutcome, PollerConfig, PollerEvent, PollerKind, PollerState, Session, Settings,
    StatusEvent, TaskParameters,
};
use tokio_util::sync::CancellationToken;

/// Test helper wiring a coordinator to mocks.
struct TestHarness {
    coordinator: Coordinator,
    platform: Arc<MockPlatform>,
    settings: Arc<MockSettingsStore>,
    events: UnboundedReceiver<StatusEvent>,
}

impl TestHarness {
    fn new(authenticated: bool) -> Self {
        Self::with_settings(authenticated, Settings::default())
    }

    fn with_settings(authenticated: bool, settings: Settings) -> Self {
        let platform = Arc::new(MockPlatform::new());
        let settings = Arc::new(MockSettingsStore::with_settings(settings));
        let session = Arc::new(Session::new(platform.clone(), authenticated));
        let (handle, events) = event_channel();
        let coordinator =
            Coordinator::new(session, settings.clone(), handle, PollerConfig::default());

        Self {
            coordinator,
            platform,
            settings,
            events,
        }
    }

    fn events(&mut self) -> Vec<PollerEvent> {
        collect_events(&mut self.events)
    }

    fn event_types(&mut self) -> Vec<&'static str> {
        self.events().iter().map(|e| e.event_type()).collect()
    }

    fn count(&self, predicate: impl Fn(&PlatformCall) -> bool) -> usize {
        self.platform.count(predicate)
    }
}

fn is_acquisition_call(call: &PlatformCall) -> bool {
    matches!(
        call,
        PlatformCall::FetchItemDetail(_)
            | PlatformCall::CheckStock { .. }
            | PlatformCall::ClearCart
            | PlatformCall::AddToCart { .. }
            | PlatformCall::SubmitOrder
    )
}

// =============================================================================
// Login stage
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_auth_poller_ticket_on_first_attempt() {
    let platform = Arc::new(MockPlatform::new());
    platform.set_ticket_after(1);
    let session = Arc::new(Session::new(platform.clone(), false));
    let (handle, mut rx) = event_channel();

    let outcome = AuthPoller::new(
        session.clone(),
        handle,
        CancellationToken::new(),
        &PollerConfig::default(),
    )
    .run()
    .await;

    assert_eq!(outcome, AuthOutcome::Authenticated);
    assert!(session.is_authenticated());
    assert_eq!(collect_events(&mut rx), vec![PollerEvent::Authenticated]);
}

#[tokio::test(start_paused = true)]
async fn test_login_then_purchase() {
    let mut h = TestHarness::new(false);
    h.platform.set_ticket_after(1);
    h.platform.script_stock([Ok(true)]);
    h.platform.script_submissions([Ok(true)]);

    h.coordinator
        .start_acquisition(fixtures::task_parameters())
        .await
        .unwrap();
    h.coordinator.wait().await;

    assert!(h.coordinator.session().is_authenticated());
    assert_eq!(
        h.event_types(),
        vec!["authenticated", "attempting", "purchased"]
    );
    assert_eq!(h.count(|c| matches!(c, PlatformCall::FetchQrCode)), 1);
    assert_eq!(h.count(|c| matches!(c, PlatformCall::SaveCredentials)), 1);

    let status = h.coordinator.status().await;
    assert!(status.flow.is_none());
    assert_eq!(
        status.last_result.unwrap().outcome,
        FlowOutcome::Acquisition {
            outcome: AcquisitionOutcome::Purchased { submit_attempts: 1 }
        }
    );
}

#[tokio::test(start_paused = true)]
async fn test_expired_login_does_not_start_acquisition() {
    let mut h = TestHarness::new(false);

    h.coordinator
        .start_acquisition(fixtures::task_parameters())
        .await
        .unwrap();
    h.coordinator.wait().await;

    assert_eq!(h.events(), vec![PollerEvent::LoginExpired { attempts: 85 }]);
    assert_eq!(h.count(|c| matches!(c, PlatformCall::FetchTicket)), 85);
    assert_eq!(h.count(is_acquisition_call), 0);
    assert!(h.settings.saves().is_empty());
    assert_eq!(
        h.coordinator.status().await.last_result.unwrap().outcome,
        FlowOutcome::Login {
            outcome: AuthOutcome::Expired
        }
    );
}

#[tokio::test(start_paused = true)]
async fn test_invalid_login_does_not_start_acquisition() {
    let mut h = TestHarness::new(false);
    h.platform.set_ticket_after(4);
    h.platform.set_ticket_valid(false);

    h.coordinator
        .start_acquisition(fixtures::task_parameters())
        .await
        .unwrap();
    h.coordinator.wait().await;

    assert!(!h.coordinator.session().is_authenticated());
    assert_eq!(h.events(), vec![PollerEvent::LoginInvalid]);
    assert_eq!(h.count(|c| matches!(c, PlatformCall::ValidateTicket(_))), 1);
    assert_eq!(h.count(is_acquisition_call), 0);
}

#[tokio::test(start_paused = true)]
async fn test_qr_code_failure_reports_login_unavailable() {
    let mut h = TestHarness::new(false);
    h.platform
        .fail_qr_code(snapcart_core::PlatformError::Request("offline".to_string()));

    h.coordinator
        .start_acquisition(fixtures::task_parameters())
        .await
        .unwrap();
    h.coordinator.wait().await;

    let events = h.events();
    assert_eq!(events.len(), 1);
    assert!(matches!(events[0], PollerEvent::LoginUnavailable { .. }));
    assert_eq!(h.count(|c| matches!(c, PlatformCall::FetchTicket)), 0);
    assert_eq!(
        h.coordinator.status().await.last_result.unwrap().outcome,
        FlowOutcome::LoginUnavailable
    );
}

#[tokio::test(start_paused = true)]
async fn test_qr_code_available_while_logging_in() {
    let h = TestHarness::new(false);

    h.coordinator
        .start_acquisition(fixtures::task_parameters())
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_secs(3)).await;

    assert!(h.coordinator.login_qr().await.is_some());
    assert_eq!(
        h.coordinator.status().await.flow.unwrap().stage,
        PollerKind::Auth
    );

    assert!(h.coordinator.cancel_current().await);
    h.coordinator.wait().await;

    assert!(h.coordinator.login_qr().await.is_none());
}

#[tokio::test(start_paused = true)]
async fn test_cancel_during_login() {
    let mut h = TestHarness::new(false);

    h.coordinator
        .start_acquisition(fixtures::task_parameters())
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_secs(7)).await;
    assert!(h.coordinator.cancel_current().await);
    h.coordinator.wait().await;

    let polls = h.count(|c| matches!(c, PlatformCall::FetchTicket));
    assert_eq!(polls, 4);
    assert_eq!(h.events(), vec![PollerEvent::LoginCancelled]);
    assert_eq!(h.count(is_acquisition_call), 0);

    tokio::time::sleep(Duration::from_secs(60)).await;
    assert_eq!(h.count(|c| matches!(c, PlatformCall::FetchTicket)), polls);
}

// =============================================================================
// Acquisition stage
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_authenticated_session_skips_login() {
    let mut h = TestHarness::new(true);
    h.platform.script_stock([Ok(false), Ok(false), Ok(true)]);
    h.platform.script_submissions([Ok(false), Ok(true)]);

    h.coordinator
        .start_acquisition(fixtures::task_parameters())
        .await
        .unwrap();
    h.coordinator.wait().await;

    assert_eq!(
        h.event_types(),
        vec!["waiting", "waiting", "attempting", "purchased"]
    );
    assert_eq!(h.count(|c| matches!(c, PlatformCall::SubmitOrder)), 2);
    assert_eq!(h.count(|c| matches!(c, PlatformCall::FetchQrCode)), 0);
    assert_eq!(h.count(|c| matches!(c, PlatformCall::FetchTicket)), 0);
}

#[tokio::test(start_paused = true)]
async fn test_task_saved_and_password_forwarded() {
    let h = TestHarness::with_settings(
        true,
        Settings {
            payment_password: Some("123456".to_string()),
            ..Default::default()
        },
    );
    h.platform.script_stock([Ok(true)]);
    h.platform.script_submissions([Ok(true)]);

    h.coordinator
        .start_acquisition(fixtures::task_parameters())
        .await
        .unwrap();
    h.coordinator.wait().await;

    let saves = h.settings.saves();
    assert_eq!(saves.len(), 1);
    assert_eq!(saves[0].item_id, fixtures::ITEM_ID);
    assert_eq!(saves[0].count, 2);
    assert_eq!(saves[0].payment_password.as_deref(), Some("123456"));
    assert_eq!(h.platform.payment_password().as_deref(), Some("123456"));
}

#[tokio::test(start_paused = true)]
async fn test_settings_failure_does_not_stop_flow() {
    let mut h = TestHarness::new(true);
    h.settings.fail_saves();
    h.platform.script_stock([Ok(true)]);
    h.platform.script_submissions([Ok(true)]);

    h.coordinator
        .start_acquisition(fixtures::task_parameters())
        .await
        .unwrap();
    h.coordinator.wait().await;

    assert_eq!(h.event_types(), vec!["attempting", "purchased"]);
}

#[tokio::test(start_paused = true)]
async fn test_start_from_settings() {
    let h = TestHarness::with_settings(true, fixtures::settings());
    h.platform.script_stock([Ok(true)]);
    h.platform.script_submissions([Ok(true)]);

    h.coordinator.start_from_settings().await.unwrap();
    h.coordinator.wait().await;

    assert!(h.platform.calls().contains(&PlatformCall::AddToCart {
        item_id: fixtures::ITEM_ID.to_string(),
        count: 2,
    }));
}

#[tokio::test(start_paused = true)]
async fn test_start_from_empty_settings_fails() {
    let h = TestHarness::new(true);

    let result = h.coordinator.start_from_settings().await;

    assert!(matches!(result, Err(CoordinatorError::Settings(_))));
    assert!(!h.coordinator.is_running().await);
}

// =============================================================================
// Single flight and cancellation
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_second_start_rejected_while_running() {
    let mut h = TestHarness::new(true);

    let id = h
        .coordinator
        .start_acquisition(fixtures::task_parameters())
        .await
        .unwrap();
    let second = h
        .coordinator
        .start_acquisition(fixtures::task_parameters())
        .await;
    assert!(matches!(second, Err(CoordinatorError::AlreadyRunning(running)) if running == id));

    tokio::time::sleep(Duration::from_secs(4)).await;
    assert!(h.coordinator.cancel_current().await);
    assert!(!h.coordinator.cancel_current().await);
    assert!(h.coordinator.status().await.flow.unwrap().cancelling);
    h.coordinator.wait().await;

    let events = h.events();
    let cancelled = events
        .iter()
        .filter(|e| **e == PollerEvent::PurchaseCancelled)
        .count();
    assert_eq!(cancelled, 1);
    assert_eq!(events.last(), Some(&PollerEvent::PurchaseCancelled));
    assert_eq!(h.count(|c| matches!(c, PlatformCall::CheckStock { .. })), 2);

    // The slot is free again.
    assert!(h
        .coordinator
        .start_acquisition(fixtures::task_parameters())
        .await
        .is_ok());
    h.coordinator.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_cancel_when_idle_is_noop() {
    let mut h = TestHarness::new(true);

    assert!(!h.coordinator.cancel_current().await);

    assert!(h.events().is_empty());
    assert!(h.platform.calls().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_stops_running_flow() {
    let mut h = TestHarness::new(true);

    h.coordinator
        .start_acquisition(fixtures::task_parameters())
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_secs(1)).await;
    h.coordinator.shutdown().await;

    assert!(!h.coordinator.is_running().await);
    assert_eq!(h.events().last(), Some(&PollerEvent::PurchaseCancelled));
    assert_eq!(
        h.coordinator.status().await.last_result.unwrap().outcome,
        FlowOutcome::Acquisition {
            outcome: AcquisitionOutcome::Cancelled
        }
    );
}

#[tokio::test(start_paused = true)]
async fn test_out_of_range_task_is_not_persisted() {
    let h = TestHarness::with_settings(true, fixtures::settings());

    let result = h
        .coordinator
        .start_acquisition(TaskParameters::new(fixtures::ITEM_ID, fixtures::AREA_ID, 50, 600))
        .await;

    assert!(matches!(result, Err(CoordinatorError::InvalidParameters(_))));
    assert!(h.settings.saves().is_empty());
    assert_eq!(h.settings.current(), fixtures::settings());
    assert!(h.platform.calls().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_crashed_flow_releases_slot() {
    let h = TestHarness::new(true);
    h.platform.panic_on_stock_check();

    let id = h
        .coordinator
        .start_acquisition(fixtures::task_parameters())
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(10)).await;

    assert!(!h.coordinator.is_running().await);
    let result = h.coordinator.status().await.last_result.unwrap();
    assert_eq!(result.id, id);
    assert_eq!(result.outcome, FlowOutcome::Aborted);
    assert_eq!(result.state, PollerState::Failed);

    // A new flow can start.
    let second = h
        .coordinator
        .start_acquisition(fixtures::task_parameters())
        .await
        .unwrap();
    assert_ne!(second, id);
}

#[tokio::test(start_paused = true)]
async fn test_wait_on_crashed_flow_releases_slot() {
    let h = TestHarness::new(true);
    h.platform.panic_on_stock_check();

    h.coordinator
        .start_acquisition(fixtures::task_parameters())
        .await
        .unwrap();
    h.coordinator.wait().await;

    assert!(!h.coordinator.is_running().await);
    assert_eq!(
        h.coordinator.status().await.last_result.unwrap().outcome,
        FlowOutcome::Aborted
    );
    assert!(!h.coordinator.cancel_current().await);
}

// =============================================================================
// Observers
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_observer_receives_categorised_events() {
    let platform = Arc::new(MockPlatform::new());
    platform.set_ticket_after(1);
    platform.script_stock([Ok(false), Ok(true)]);
    platform.script_submissions([Ok(true)]);

    let seen: Arc<Mutex<Vec<(EventCategory, String)>>> = Arc::new(Mutex::new(Vec::new()));
    let recorder = seen.clone();
    let (handle, dispatcher) = create_event_channel();
    let dispatcher = dispatcher.with_observer(Arc::new(move |event: &StatusEvent| {
        recorder
            .lock()
            .unwrap()
            .push((event.category, event.message.clone()));
    }));
    let dispatcher_task = tokio::spawn(dispatcher.run());

    let session = Arc::new(Session::new(platform, false));
    let coordinator = Coordinator::new(
        session,
        Arc::new(MockSettingsStore::new()),
        handle,
        PollerConfig::default(),
    );
    coordinator
        .start_acquisition(fixtures::task_parameters())
        .await
        .unwrap();
    coordinator.wait().await;
    drop(coordinator);
    dispatcher_task.await.unwrap();

    let seen = seen.lock().unwrap();
    let categories: Vec<EventCategory> = seen.iter().map(|(c, _)| *c).collect();
    assert_eq!(
        categories,
        vec![
            EventCategory::Success,
            EventCategory::Info,
            EventCategory::Info,
            EventCategory::Success,
        ]
    );
    assert_eq!(
        seen[1].1,
        format!(
            "{} cannot be ordered yet, checking again in 3s",
            fixtures::ITEM_ID
        )
    );
}
