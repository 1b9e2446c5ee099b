//! Common test utilities for API testing with mocks.
//!
//! This module provides a test fixture that builds the router in-process
//! with a mock platform and an in-memory settings store, so flows can be
//! driven end to end without a real shop.

use std::sync::Arc;
use std::time::Duration;

use axum::body::{Body, Bytes};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tower::ServiceExt;

use snapcart_core::{
    create_event_channel, Config, Coordinator, PollerConfig, Session, Settings,
    testing::{MockPlatform, MockSettingsStore},
};
use snapcart_server::api::{create_router, RecentEvents, WsBroadcaster};
use snapcart_server::state::AppState;

/// Re-export fixtures for test convenience
pub use snapcart_core::testing::fixtures;

/// Test fixture for API testing with mock dependencies.
///
/// # Example
///
/// ```rust,ignore
/// #[tokio::test]
/// async fn test_start() {
///     let fixture = TestFixture::new().await;
///
///     let response = fixture.post("/api/v1/acquisition", json!({
///         "item_id": "1", "area_id": "2", "count": 1, "poll_interval_secs": 3
///     })).await;
///
///     assert_eq!(response.status, 202);
/// }
/// ```
pub struct TestFixture {
    pub router: Router,
    /// Mock platform - script login, stock and submissions
    pub platform: Arc<MockPlatform>,
    pub settings: Arc<MockSettingsStore>,
    pub coordinator: Arc<Coordinator>,
    pub recent_events: Arc<RecentEvents>,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

/// Raw response, for non-JSON endpoints.
#[derive(Debug)]
pub struct RawResponse {
    pub status: StatusCode,
    pub content_type: Option<String>,
    pub body: Bytes,
}

impl TestFixture {
    /// Fixture with a logged-in session and empty settings.
    pub async fn new() -> Self {
        Self::with_config(TestConfig::default()).await
    }

    pub async fn with_config(test_config: TestConfig) -> Self {
        let platform = Arc::new(MockPlatform::new());
        platform.set_logged_in(!test_config.logged_out);

        let settings = Arc::new(match test_config.settings {
            Some(settings) => MockSettingsStore::with_settings(settings),
            None => MockSettingsStore::new(),
        });

        let session = Arc::new(Session::new(platform.clone(), !test_config.logged_out));

        let ws_broadcaster = WsBroadcaster::default();
        let recent_events = Arc::new(RecentEvents::default());
        let (events, dispatcher) = create_event_channel();
        let dispatcher = dispatcher
            .with_observer(recent_events.clone())
            .with_observer(Arc::new(ws_broadcaster.clone()));
        tokio::spawn(dispatcher.run());

        let coordinator = Arc::new(Coordinator::new(
            session,
            settings.clone(),
            events,
            PollerConfig::default(),
        ));

        let state = Arc::new(AppState::new(
            Config::default(),
            Arc::clone(&coordinator),
            Arc::clone(&recent_events),
            ws_broadcaster,
            CancellationToken::new(),
        ));

        Self {
            router: create_router(state),
            platform,
            settings,
            coordinator,
            recent_events,
        }
    }

    pub async fn get(&self, path: &str) -> TestResponse {
        self.request("GET", path, None).await
    }

    /// Send a POST request with JSON body.
    pub async fn post(&self, path: &str, body: Value) -> TestResponse {
        self.request("POST", path, Some(body)).await
    }

    /// Send a POST request without a body.
    pub async fn post_empty(&self, path: &str) -> TestResponse {
        self.request("POST", path, None).await
    }

    pub async fn put(&self, path: &str, body: Value) -> TestResponse {
        self.request("PUT", path, Some(body)).await
    }

    /// Send a GET request and keep the body as bytes.
    pub async fn get_raw(&self, path: &str) -> RawResponse {
        let request = Request::builder()
            .method("GET")
            .uri(path)
            .body(Body::empty())
            .unwrap();

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();

        RawResponse {
            status,
            content_type,
            body,
        }
    }

    async fn request(&self, method: &str, path: &str, body: Option<Value>) -> TestResponse {
        let mut request_builder = Request::builder().method(method).uri(path);

        let body = if let Some(json_body) = body {
            request_builder = request_builder.header("Content-Type", "application/json");
            Body::from(serde_json::to_vec(&json_body).unwrap())
        } else {
            Body::empty()
        };

        let request = request_builder.body(body).unwrap();

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let body_bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();

        let body: Value = if body_bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body_bytes).unwrap_or(Value::Null)
        };

        TestResponse { status, body }
    }

    /// Poll `condition` every 10ms for up to two seconds.
    pub async fn eventually<F, Fut>(&self, mut condition: F) -> bool
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = bool>,
    {
        for _ in 0..200 {
            if condition().await {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        false
    }
}

/// Configuration for test fixture.
#[derive(Debug, Clone, Default)]
pub struct TestConfig {
    /// Start with a session that still needs the QR login
    pub logged_out: bool,
    /// Initial contents of the settings store
    pub settings: Option<Settings>,
}

impl TestConfig {
    pub fn logged_out() -> Self {
        Self {
            logged_out: true,
            ..Default::default()
        }
    }

    pub fn with_settings(settings: Settings) -> Self {
        Self {
            settings: Some(settings),
            ..Default::default()
        }
    }
}

/// Helper to assert a response has expected status.
#[macro_export]
macro_rules! assert_status {
    ($response:expr, $status:expr) => {
        assert_eq!(
            $response.status, $status,
            "Expected status {:?}, got {:?}. Body: {}",
            $status,
            $response.status,
            serde_json::to_string_pretty(&$response.body).unwrap_or_default()
        )
    };
}
