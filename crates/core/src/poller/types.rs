//! Types shared by the pollers.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Largest purchase quantity a task may ask for.
pub const MAX_COUNT: u32 = 9;

/// Longest stock poll interval a task may use (seconds).
pub const MAX_POLL_INTERVAL_SECS: u64 = 9;

/// Lifecycle of a single poller instance.
///
/// `Running` is the only state in which iterations happen. Terminal states are
/// final; the next attempt gets a fresh poller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PollerState {
    Idle,
    Running,
    Succeeded,
    Failed,
    Cancelled,
}

/// Which poller a flow is currently running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PollerKind {
    Auth,
    Acquisition,
}

/// Rejected task parameters.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidParameters {
    #[error("item id must not be empty")]
    EmptyItemId,

    #[error("area id must not be empty")]
    EmptyAreaId,

    #[error("count must be at least 1")]
    ZeroCount,

    #[error("count must be at most {max}", max = MAX_COUNT)]
    CountTooLarge,

    #[error("poll interval must be at least 1 second")]
    ZeroInterval,

    #[error("poll interval must be at most {max} seconds", max = MAX_POLL_INTERVAL_SECS)]
    IntervalTooLong,
}

/// What to buy, where, how many, and how often to check.
///
/// Immutable once handed to a poller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskParameters {
    pub item_id: String,
    /// Delivery region, e.g. `"1_2901_55549"`.
    pub area_id: String,
    pub count: u32,
    pub poll_interval_secs: u64,
}

impl TaskParameters {
    pub fn new(
        item_id: impl Into<String>,
        area_id: impl Into<String>,
        count: u32,
        poll_interval_secs: u64,
    ) -> Self {
        Self {
            item_id: item_id.into(),
            area_id: area_id.into(),
            count,
            poll_interval_secs,
        }
    }

    pub fn validate(&self) -> Result<(), InvalidParameters> {
        if self.item_id.trim().is_empty() {
            return Err(InvalidParameters::EmptyItemId);
        }
        if self.area_id.trim().is_empty() {
            return Err(InvalidParameters::EmptyAreaId);
        }
        if self.count == 0 {
            return Err(InvalidParameters::ZeroCount);
        }
        if self.count > MAX_COUNT {
            return Err(InvalidParameters::CountTooLarge);
        }
        if self.poll_interval_secs == 0 {
            return Err(InvalidParameters::ZeroInterval);
        }
        if self.poll_interval_secs > MAX_POLL_INTERVAL_SECS {
            return Err(InvalidParameters::IntervalTooLong);
        }
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }
}

/// How an [`AuthPoller`](super::AuthPoller) run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthOutcome {
    Authenticated,
    /// No ticket within the attempt budget.
    Expired,
    /// The ticket failed validation.
    Invalid,
    Cancelled,
}

impl AuthOutcome {
    pub fn state(&self) -> PollerState {
        match self {
            Self::Authenticated => PollerState::Succeeded,
            Self::Expired | Self::Invalid => PollerState::Failed,
            Self::Cancelled => PollerState::Cancelled,
        }
    }
}

/// How an [`AcquisitionPoller`](super::AcquisitionPoller) run ended.
///
/// There is no failure variant: exhausted submissions go back to polling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum AcquisitionOutcome {
    Purchased { submit_attempts: u32 },
    Cancelled,
}

impl AcquisitionOutcome {
    pub fn state(&self) -> PollerState {
        match self {
            Self::Purchased { .. } => PollerState::Succeeded,
            Self::Cancelled => PollerState::Cancelled,
        }
    }
}
