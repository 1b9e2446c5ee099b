//! The single user session shared by the pollers.
//!
//! [`Session`] wraps a [`Platform`] backend together with the state the core
//! owns: the authenticated flag and the per-run item detail cache. Pollers only
//! reach the platform through the capability methods exposed here.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::platform::{ItemDetail, Platform, PlatformError};

pub struct Session {
    platform: Arc<dyn Platform>,
    authenticated: AtomicBool,
    item_cache: RwLock<HashMap<String, ItemDetail>>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("platform", &self.platform.name())
            .field("authenticated", &self.is_authenticated())
            .finish()
    }
}

impl Session {
    /// Create a session with a known authentication state.
    pub fn new(platform: Arc<dyn Platform>, authenticated: bool) -> Self {
        Self {
            platform,
            authenticated: AtomicBool::new(authenticated),
            item_cache: RwLock::new(HashMap::new()),
        }
    }

    /// Create a session from the platform's stored credentials.
    ///
    /// Fails closed: if the check errors, the session starts unauthenticated.
    pub async fn restore(platform: Arc<dyn Platform>) -> Self {
        let authenticated = match platform.is_logged_in().await {
            Ok(logged_in) => logged_in,
            Err(e) => {
                warn!("Failed to check stored credentials: {}", e);
                false
            }
        };
        info!(
            "Session restored from {} backend (authenticated: {})",
            platform.name(),
            authenticated
        );
        Self::new(platform, authenticated)
    }

    pub fn platform_name(&self) -> &'static str {
        self.platform.name()
    }

    pub fn is_authenticated(&self) -> bool {
        self.authenticated.load(Ordering::SeqCst)
    }

    /// Flip the session to authenticated. Returns `false` if it already was.
    pub(crate) fn mark_authenticated(&self) -> bool {
        !self.authenticated.swap(true, Ordering::SeqCst)
    }

    pub async fn login_qr_code(&self) -> Result<Vec<u8>, PlatformError> {
        self.platform.fetch_qr_code().await
    }

    pub async fn fetch_ticket(&self) -> Result<Option<String>, PlatformError> {
        self.platform.fetch_ticket().await
    }

    pub async fn validate_ticket(&self, ticket: &str) -> Result<bool, PlatformError> {
        self.platform.validate_ticket(ticket).await
    }

    pub async fn persist_credentials(&self) -> Result<(), PlatformError> {
        self.platform.save_credentials().await
    }

    /// Fetch the item detail from the platform and cache it.
    pub async fn refresh_item_detail(&self, item_id: &str) -> Result<ItemDetail, PlatformError> {
        let detail = self.platform.fetch_item_detail(item_id).await?;
        self.item_cache
            .write()
            .await
            .insert(item_id.to_string(), detail.clone());
        Ok(detail)
    }

    pub async fn cached_item_detail(&self, item_id: &str) -> Option<ItemDetail> {
        self.item_cache.read().await.get(item_id).cloned()
    }

    pub async fn check_availability(
        &self,
        item_id: &str,
        quantity: u32,
        area_id: &str,
    ) -> Result<bool, PlatformError> {
        self.platform.check_stock(item_id, quantity, area_id).await
    }

    pub async fn clear_cart(&self) -> Result<(), PlatformError> {
        self.platform.clear_cart().await
    }

    pub async fn add_to_cart(&self, item_id: &str, count: u32) -> Result<(), PlatformError> {
        self.platform.add_to_cart(item_id, count).await
    }

    pub async fn submit_order(&self) -> Result<bool, PlatformError> {
        self.platform.submit_order().await
    }

    pub fn set_payment_password(&self, password: Option<String>) {
        self.platform.set_payment_password(password);
    }
}
