//! Types for the flow coordinator.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::poller::{AcquisitionOutcome, AuthOutcome, InvalidParameters, PollerKind, PollerState};
use crate::settings::SettingsError;

/// Errors returned when starting a flow.
#[derive(Debug, Error)]
pub enum CoordinatorError {
    /// A flow is already running against the session.
    #[error("a flow is already running: {0}")]
    AlreadyRunning(Uuid),

    #[error("invalid task parameters: {0}")]
    InvalidParameters(#[from] InvalidParameters),

    #[error("settings error: {0}")]
    Settings(#[from] SettingsError),
}

/// How a flow ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "stage", rename_all = "snake_case")]
pub enum FlowOutcome {
    /// No login QR code could be fetched.
    LoginUnavailable,
    /// The login stage ended without authenticating.
    Login { outcome: AuthOutcome },
    Acquisition { outcome: AcquisitionOutcome },
    /// The flow task died before reporting an outcome.
    Aborted,
}

impl FlowOutcome {
    /// Terminal state of the last poller the flow ran.
    pub fn state(&self) -> PollerState {
        match self {
            Self::LoginUnavailable | Self::Aborted => PollerState::Failed,
            Self::Login { outcome } => outcome.state(),
            Self::Acquisition { outcome } => outcome.state(),
        }
    }
}

/// A finished flow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowResult {
    pub id: Uuid,
    pub item_id: String,
    pub finished_at: DateTime<Utc>,
    pub state: PollerState,
    pub outcome: FlowOutcome,
}

impl FlowResult {
    pub fn new(id: Uuid, item_id: impl Into<String>, outcome: FlowOutcome) -> Self {
        Self {
            id,
            item_id: item_id.into(),
            finished_at: Utc::now(),
            state: outcome.state(),
            outcome,
        }
    }
}

/// The running flow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowStatus {
    pub id: Uuid,
    pub item_id: String,
    pub started_at: DateTime<Utc>,
    /// Which poller is currently running.
    pub stage: PollerKind,
    /// Cancellation was requested but the poller has not stopped yet.
    pub cancelling: bool,
}

/// Current status of the coordinator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoordinatorStatus {
    pub platform: String,
    pub authenticated: bool,
    pub flow: Option<FlowStatus>,
    pub last_result: Option<FlowResult>,
}
