use std::sync::Arc;

use snapcart_core::{Config, Coordinator, SanitizedConfig, Session, SettingsStore};
use tokio_util::sync::CancellationToken;

use crate::api::{RecentEvents, WsBroadcaster};

/// Shared application state
pub struct AppState {
    config: Config,
    coordinator: Arc<Coordinator>,
    recent_events: Arc<RecentEvents>,
    ws_broadcaster: WsBroadcaster,
    /// Cancelled when the server starts shutting down.
    shutdown: CancellationToken,
}

impl AppState {
    pub fn new(
        config: Config,
        coordinator: Arc<Coordinator>,
        recent_events: Arc<RecentEvents>,
        ws_broadcaster: WsBroadcaster,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            config,
            coordinator,
            recent_events,
            ws_broadcaster,
            shutdown,
        }
    }

    pub fn sanitized_config(&self) -> SanitizedConfig {
        SanitizedConfig::from(&self.config)
    }

    pub fn coordinator(&self) -> &Arc<Coordinator> {
        &self.coordinator
    }

    pub fn session(&self) -> &Arc<Session> {
        self.coordinator.session()
    }

    pub fn settings(&self) -> &Arc<dyn SettingsStore> {
        self.coordinator.settings()
    }

    pub fn recent_events(&self) -> &RecentEvents {
        &self.recent_events
    }

    pub fn ws_broadcaster(&self) -> &WsBroadcaster {
        &self.ws_broadcaster
    }

    pub fn shutdown_token(&self) -> &CancellationToken {
        &self.shutdown
    }
}
