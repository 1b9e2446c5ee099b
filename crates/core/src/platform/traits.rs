use async_trait::async_trait;
use thiserror::Error;

use super::types::ItemDetail;

/// Errors surfaced by a platform backend.
///
/// Every variant is treated as transient by the pollers.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PlatformError {
    #[error("Platform request failed: {0}")]
    Request(String),

    #[error("Platform rejected the request: {0}")]
    Rejected(String),

    #[error("Session is not logged in")]
    NotLoggedIn,

    #[error("Item not found: {0}")]
    ItemNotFound(String),

    #[error("Failed to persist credentials: {0}")]
    Persistence(String),
}

/// Capabilities the core consumes from the retail platform.
///
/// Implementations own cookies, HTTP sessions and the wire protocol. Calls are
/// not preemptible: once issued, a call runs to completion.
#[async_trait]
pub trait Platform: Send + Sync {
    /// Short backend name for logs and status output.
    fn name(&self) -> &'static str;

    /// Whether stored credentials still represent a logged-in session.
    async fn is_logged_in(&self) -> Result<bool, PlatformError>;

    /// Fetch the login QR code image the user scans.
    async fn fetch_qr_code(&self) -> Result<Vec<u8>, PlatformError>;

    /// Fetch the login ticket, `None` while the QR code has not been confirmed.
    async fn fetch_ticket(&self) -> Result<Option<String>, PlatformError>;

    /// Validate a confirmed ticket and establish the login cookies.
    async fn validate_ticket(&self, ticket: &str) -> Result<bool, PlatformError>;

    /// Persist the current credentials so a restart can skip the login.
    async fn save_credentials(&self) -> Result<(), PlatformError>;

    async fn fetch_item_detail(&self, item_id: &str) -> Result<ItemDetail, PlatformError>;

    /// Whether `quantity` units of the item can be bought in `area_id` right now.
    async fn check_stock(
        &self,
        item_id: &str,
        quantity: u32,
        area_id: &str,
    ) -> Result<bool, PlatformError>;

    /// Empty the cart. Clearing an empty cart succeeds.
    async fn clear_cart(&self) -> Result<(), PlatformError>;

    async fn add_to_cart(&self, item_id: &str, count: u32) -> Result<(), PlatformError>;

    /// Submit the current cart as an order. `Ok(false)` means the platform
    /// declined the submission.
    async fn submit_order(&self) -> Result<bool, PlatformError>;

    /// Payment password used when the order is paid with stored balance.
    fn set_payment_password(&self, password: Option<String>);
}
