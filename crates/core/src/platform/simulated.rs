//! Offline platform backend for dry runs.
//!
//! Follows a fixed script: the login ticket shows up after a number of polls,
//! stock appears after a number of checks and the order is accepted on a given
//! submission attempt. No network traffic is involved.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{ItemDetail, Platform, PlatformError};

/// 1x1 transparent PNG served as the login QR code.
const PLACEHOLDER_QR_PNG: &[u8] = &[
    0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44,
    0x52, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x06, 0x00, 0x00, 0x00, 0x1F,
    0x15, 0xC4, 0x89, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x44, 0x41, 0x54, 0x78, 0xDA, 0x63, 0x64,
    0x60, 0xF8, 0x5F, 0x0F, 0x00, 0x02, 0x87, 0x01, 0x80, 0xEB, 0x47, 0xBA, 0x92, 0x00, 0x00,
    0x00, 0x00, 0x49, 0x45, 0x4E, 0x44, 0xAE, 0x42, 0x60, 0x82,
];

/// Script for [`SimulatedPlatform`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulatedPlatformConfig {
    /// Start with stored, valid credentials.
    #[serde(default)]
    pub logged_in: bool,

    /// Ticket poll on which the QR code counts as scanned (1-based, 0 = never).
    #[serde(default = "default_ticket_after_polls")]
    pub ticket_after_polls: u32,

    /// Whether the scanned ticket passes validation.
    #[serde(default = "default_true")]
    pub ticket_valid: bool,

    /// Stock check on which the item becomes available (1-based, 0 = never).
    #[serde(default = "default_in_stock_after_checks")]
    pub in_stock_after_checks: u32,

    /// Submission attempt that gets accepted (1-based, 0 = never).
    #[serde(default = "default_accept_order_on_attempt")]
    pub accept_order_on_attempt: u32,
}

fn default_ticket_after_polls() -> u32 {
    3
}

fn default_true() -> bool {
    true
}

fn default_in_stock_after_checks() -> u32 {
    5
}

fn default_accept_order_on_attempt() -> u32 {
    2
}

impl Default for SimulatedPlatformConfig {
    fn default() -> Self {
        Self {
            logged_in: false,
            ticket_after_polls: default_ticket_after_polls(),
            ticket_valid: true,
            in_stock_after_checks: default_in_stock_after_checks(),
            accept_order_on_attempt: default_accept_order_on_attempt(),
        }
    }
}

/// Scripted platform used by the binary when no real backend is wired in.
#[derive(Debug)]
pub struct SimulatedPlatform {
    config: SimulatedPlatformConfig,
    logged_in: AtomicBool,
    ticket_polls: AtomicU32,
    stock_checks: AtomicU32,
    submissions: AtomicU32,
    cart: Mutex<Vec<(String, u32)>>,
    payment_password: Mutex<Option<String>>,
}

impl SimulatedPlatform {
    pub fn new(config: SimulatedPlatformConfig) -> Self {
        Self {
            logged_in: AtomicBool::new(config.logged_in),
            config,
            ticket_polls: AtomicU32::new(0),
            stock_checks: AtomicU32::new(0),
            submissions: AtomicU32::new(0),
            cart: Mutex::new(Vec::new()),
            payment_password: Mutex::new(None),
        }
    }

    /// Items currently in the simulated cart.
    pub fn cart(&self) -> Vec<(String, u32)> {
        self.cart.lock().map(|cart| cart.clone()).unwrap_or_default()
    }

    fn reached(counter: &AtomicU32, threshold: u32) -> bool {
        let seen = counter.fetch_add(1, Ordering::SeqCst) + 1;
        threshold != 0 && seen >= threshold
    }
}

#[async_trait]
impl Platform for SimulatedPlatform {
    fn name(&self) -> &'static str {
        "simulated"
    }

    async fn is_logged_in(&self) -> Result<bool, PlatformError> {
        Ok(self.logged_in.load(Ordering::SeqCst))
    }

    async fn fetch_qr_code(&self) -> Result<Vec<u8>, PlatformError> {
        self.ticket_polls.store(0, Ordering::SeqCst);
        Ok(PLACEHOLDER_QR_PNG.to_vec())
    }

    async fn fetch_ticket(&self) -> Result<Option<String>, PlatformError> {
        if Self::reached(&self.ticket_polls, self.config.ticket_after_polls) {
            Ok(Some("simulated-ticket".to_string()))
        } else {
            Ok(None)
        }
    }

    async fn validate_ticket(&self, ticket: &str) -> Result<bool, PlatformError> {
        debug!("Validating simulated ticket {}", ticket);
        if self.config.ticket_valid {
            self.logged_in.store(true, Ordering::SeqCst);
        }
        Ok(self.config.ticket_valid)
    }

    async fn save_credentials(&self) -> Result<(), PlatformError> {
        if self.logged_in.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(PlatformError::NotLoggedIn)
        }
    }

    async fn fetch_item_detail(&self, item_id: &str) -> Result<ItemDetail, PlatformError> {
        Ok(ItemDetail::new(item_id, format!("Simulated item {}", item_id))
            .with_attribute("vendor", "simulated"))
    }

    async fn check_stock(
        &self,
        item_id: &str,
        quantity: u32,
        area_id: &str,
    ) -> Result<bool, PlatformError> {
        debug!(
            "Simulated stock check for {} x{} in area {}",
            item_id, quantity, area_id
        );
        Ok(Self::reached(
            &self.stock_checks,
            self.config.in_stock_after_checks,
        ))
    }

    async fn clear_cart(&self) -> Result<(), PlatformError> {
        self.cart
            .lock()
            .map_err(|e| PlatformError::Request(e.to_string()))?
            .clear();
        Ok(())
    }

    async fn add_to_cart(&self, item_id: &str, count: u32) -> Result<(), PlatformError> {
        self.cart
            .lock()
            .map_err(|e| PlatformError::Request(e.to_string()))?
            .push((item_id.to_string(), count));
        Ok(())
    }

    async fn submit_order(&self) -> Result<bool, PlatformError> {
        if self.cart().is_empty() {
            return Err(PlatformError::Rejected("cart is empty".to_string()));
        }
        Ok(Self::reached(
            &self.submissions,
            self.config.accept_order_on_attempt,
        ))
    }

    fn set_payment_password(&self, password: Option<String>) {
        if let Ok(mut slot) = self.payment_password.lock() {
            *slot = password;
        }
    }
}
