use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};

/// How an observer should present a status event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventCategory {
    Info,
    Success,
    Failure,
    /// User-initiated stop. Neutral, not an error.
    Cancelled,
}

/// Outcome notifications emitted by the pollers and the coordinator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PollerEvent {
    // Login
    Authenticated,
    /// The QR code window lapsed without a scan.
    LoginExpired {
        attempts: u32,
    },
    /// The scanned ticket was rejected.
    LoginInvalid,
    LoginCancelled,
    /// No QR code could be obtained to start the login.
    LoginUnavailable {
        error: String,
    },

    // Acquisition
    ItemDetailUnavailable {
        item_id: String,
        error: String,
    },
    /// The item cannot be bought yet.
    Waiting {
        item_id: String,
        retry_in_secs: u64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        reason: Option<String>,
    },
    /// Stock appeared, starting the cart and submission sequence.
    Attempting {
        item_id: String,
        count: u32,
    },
    CartRejected {
        item_id: String,
        error: String,
        retry_in_secs: u64,
    },
    /// Every submission attempt of one availability window failed.
    SubmissionExhausted {
        item_id: String,
        attempts: u32,
        retry_in_secs: u64,
    },
    Purchased {
        item_id: String,
        count: u32,
        submit_attempts: u32,
    },
    PurchaseCancelled,
}

impl PollerEvent {
    /// Stable identifier, used for metrics labels and websocket consumers.
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::Authenticated => "authenticated",
            Self::LoginExpired { .. } => "login_expired",
            Self::LoginInvalid => "login_invalid",
            Self::LoginCancelled => "login_cancelled",
            Self::LoginUnavailable { .. } => "login_unavailable",
            Self::ItemDetailUnavailable { .. } => "item_detail_unavailable",
            Self::Waiting { .. } => "waiting",
            Self::Attempting { .. } => "attempting",
            Self::CartRejected { .. } => "cart_rejected",
            Self::SubmissionExhausted { .. } => "submission_exhausted",
            Self::Purchased { .. } => "purchased",
            Self::PurchaseCancelled => "purchase_cancelled",
        }
    }

    pub fn category(&self) -> EventCategory {
        match self {
            Self::Authenticated | Self::Purchased { .. } => EventCategory::Success,
            Self::LoginExpired { .. }
            | Self::LoginInvalid
            | Self::LoginUnavailable { .. }
            | Self::CartRejected { .. }
            | Self::SubmissionExhausted { .. } => EventCategory::Failure,
            Self::LoginCancelled | Self::PurchaseCancelled => EventCategory::Cancelled,
            Self::ItemDetailUnavailable { .. }
            | Self::Waiting { .. }
            | Self::Attempting { .. } => EventCategory::Info,
        }
    }

    /// Human-readable text for the observer.
    pub fn message(&self) -> String {
        match self {
            Self::Authenticated => "Login confirmed".to_string(),
            Self::LoginExpired { attempts } => format!(
                "QR code expired after {} checks, request a new one and scan again",
                attempts
            ),
            Self::LoginInvalid => "QR code ticket failed validation".to_string(),
            Self::LoginCancelled => "Login cancelled".to_string(),
            Self::LoginUnavailable { error } => format!("Could not start login: {}", error),
            Self::ItemDetailUnavailable { item_id, error } => {
                format!("Could not load details for {}: {}", item_id, error)
            }
            Self::Waiting {
                item_id,
                retry_in_secs,
                reason: None,
            } => format!(
                "{} cannot be ordered yet, checking again in {}s",
                item_id, retry_in_secs
            ),
            Self::Waiting {
                item_id,
                retry_in_secs,
                reason: Some(reason),
            } => format!(
                "Stock check for {} failed ({}), checking again in {}s",
                item_id, reason, retry_in_secs
            ),
            Self::Attempting { item_id, count } => {
                format!("{} is available, ordering {}", item_id, count)
            }
            Self::CartRejected {
                item_id,
                error,
                retry_in_secs,
            } => format!(
                "Could not add {} to the cart ({}), checking again in {}s",
                item_id, error, retry_in_secs
            ),
            Self::SubmissionExhausted {
                item_id,
                attempts,
                retry_in_secs,
            } => format!(
                "Order for {} failed after {} attempts, checking again in {}s",
                item_id, attempts, retry_in_secs
            ),
            Self::Purchased { item_id, count, .. } => {
                format!("Order placed for {} x{}", item_id, count)
            }
            Self::PurchaseCancelled => "Order cancelled".to_string(),
        }
    }
}

/// A timestamped status notification as delivered to observers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusEvent {
    pub timestamp: DateTime<Utc>,
    pub category: EventCategory,
    pub message: String,
    pub event: PollerEvent,
}

impl StatusEvent {
    pub fn new(event: PollerEvent) -> Self {
        Self {
            timestamp: Utc::now(),
            category: event.category(),
            message: event.message(),
            event,
        }
    }
}

impl std::fmt::Display for StatusEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} {}",
            self.timestamp.with_timezone(&Local).format("%H:%M:%S"),
            self.message
        )
    }
}
