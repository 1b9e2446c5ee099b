//! Mock platform for testing.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};

use crate::platform::{ItemDetail, Platform, PlatformError};

/// Ticket handed out once the QR code counts as scanned.
pub const MOCK_TICKET: &str = "ticket-1";

/// A recorded platform call for test assertions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlatformCall {
    IsLoggedIn,
    FetchQrCode,
    FetchTicket,
    ValidateTicket(String),
    SaveCredentials,
    FetchItemDetail(String),
    CheckStock {
        item_id: String,
        quantity: u32,
        area_id: String,
    },
    ClearCart,
    AddToCart {
        item_id: String,
        count: u32,
    },
    SubmitOrder,
}

#[derive(Debug, Default)]
struct MockState {
    calls: Vec<PlatformCall>,
    logged_in: bool,
    login_check_error: Option<PlatformError>,
    qr_error: Option<PlatformError>,
    /// Ticket poll on which the ticket appears (1-based, 0 = never).
    ticket_after: u32,
    ticket_polls: u32,
    ticket_failures: u32,
    ticket_error: Option<PlatformError>,
    ticket_valid: bool,
    validation_error: Option<PlatformError>,
    save_error: Option<PlatformError>,
    item_detail_error: Option<PlatformError>,
    stock: VecDeque<Result<bool, PlatformError>>,
    panic_on_stock_check: bool,
    add_failures: u32,
    add_error: Option<PlatformError>,
    submissions: VecDeque<Result<bool, PlatformError>>,
    payment_password: Option<String>,
}

/// Mock implementation of the Platform trait.
///
/// Provides controllable behavior for testing:
/// - Script the login ticket, stock checks and order submissions
/// - Inject failures per capability
/// - Record every call for assertions
///
/// Unscripted stock checks and submissions return `Ok(false)`.
///
/// # Example
///
/// ```rust,ignore
/// let platform = Arc::new(MockPlatform::new());
/// platform.set_ticket_after(1);
/// platform.script_stock([Ok(false), Ok(true)]);
/// platform.script_submissions([Ok(true)]);
///
/// // Run a flow against it...
///
/// assert_eq!(platform.count(|c| matches!(c, PlatformCall::SubmitOrder)), 1);
/// ```
#[derive(Debug)]
pub struct MockPlatform {
    state: Mutex<MockState>,
}

impl MockPlatform {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(MockState {
                ticket_valid: true,
                ..Default::default()
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn record(&self, call: PlatformCall) -> MutexGuard<'_, MockState> {
        let mut state = self.state();
        state.calls.push(call);
        state
    }

    // =========================================================================
    // Configuration
    // =========================================================================

    pub fn set_logged_in(&self, logged_in: bool) {
        self.state().logged_in = logged_in;
    }

    pub fn fail_login_check(&self, error: PlatformError) {
        self.state().login_check_error = Some(error);
    }

    pub fn fail_qr_code(&self, error: PlatformError) {
        self.state().qr_error = Some(error);
    }

    /// Hand out the ticket on the given poll (1-based). 0 never does.
    pub fn set_ticket_after(&self, polls: u32) {
        self.state().ticket_after = polls;
    }

    /// Fail the first `count` ticket polls with `error`.
    pub fn fail_ticket_polls(&self, count: u32, error: PlatformError) {
        let mut state = self.state();
        state.ticket_failures = count;
        state.ticket_error = Some(error);
    }

    pub fn set_ticket_valid(&self, valid: bool) {
        self.state().ticket_valid = valid;
    }

    pub fn fail_validation(&self, error: PlatformError) {
        self.state().validation_error = Some(error);
    }

    pub fn fail_save_credentials(&self, error: PlatformError) {
        self.state().save_error = Some(error);
    }

    pub fn fail_item_detail(&self, error: PlatformError) {
        self.state().item_detail_error = Some(error);
    }

    /// Queue stock check results, consumed in order.
    pub fn script_stock(&self, results: impl IntoIterator<Item = Result<bool, PlatformError>>) {
        self.state().stock.extend(results);
    }

    /// Make every stock check panic, as a faulty backend would.
    pub fn panic_on_stock_check(&self) {
        self.state().panic_on_stock_check = true;
    }

    /// Fail the first `count` add-to-cart calls with `error`.
    pub fn fail_add_to_cart(&self, count: u32, error: PlatformError) {
        let mut state = self.state();
        state.add_failures = count;
        state.add_error = Some(error);
    }

    /// Queue order submission results, consumed in order.
    pub fn script_submissions(
        &self,
        results: impl IntoIterator<Item = Result<bool, PlatformError>>,
    ) {
        self.state().submissions.extend(results);
    }

    // =========================================================================
    // Inspection
    // =========================================================================

    pub fn calls(&self) -> Vec<PlatformCall> {
        self.state().calls.clone()
    }

    pub fn count(&self, predicate: impl Fn(&PlatformCall) -> bool) -> usize {
        self.state().calls.iter().filter(|call| predicate(call)).count()
    }

    pub fn payment_password(&self) -> Option<String> {
        self.state().payment_password.clone()
    }
}

impl Default for MockPlatform {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Platform for MockPlatform {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn is_logged_in(&self) -> Result<bool, PlatformError> {
        let state = self.record(PlatformCall::IsLoggedIn);
        match &state.login_check_error {
            Some(e) => Err(e.clone()),
            None => Ok(state.logged_in),
        }
    }

    async fn fetch_qr_code(&self) -> Result<Vec<u8>, PlatformError> {
        let mut state = self.record(PlatformCall::FetchQrCode);
        if let Some(e) = &state.qr_error {
            return Err(e.clone());
        }
        state.ticket_polls = 0;
        Ok(b"\x89PNG mock".to_vec())
    }

    async fn fetch_ticket(&self) -> Result<Option<String>, PlatformError> {
        let mut state = self.record(PlatformCall::FetchTicket);
        state.ticket_polls += 1;
        if state.ticket_polls <= state.ticket_failures {
            if let Some(e) = &state.ticket_error {
                return Err(e.clone());
            }
        }
        if state.ticket_after != 0 && state.ticket_polls >= state.ticket_after {
            Ok(Some(MOCK_TICKET.to_string()))
        } else {
            Ok(None)
        }
    }

    async fn validate_ticket(&self, ticket: &str) -> Result<bool, PlatformError> {
        let mut state = self.record(PlatformCall::ValidateTicket(ticket.to_string()));
        if let Some(e) = &state.validation_error {
            return Err(e.clone());
        }
        if state.ticket_valid {
            state.logged_in = true;
        }
        Ok(state.ticket_valid)
    }

    async fn save_credentials(&self) -> Result<(), PlatformError> {
        let state = self.record(PlatformCall::SaveCredentials);
        match &state.save_error {
            Some(e) => Err(e.clone()),
            None => Ok(()),
        }
    }

    async fn fetch_item_detail(&self, item_id: &str) -> Result<ItemDetail, PlatformError> {
        let state = self.record(PlatformCall::FetchItemDetail(item_id.to_string()));
        match &state.item_detail_error {
            Some(e) => Err(e.clone()),
            None => Ok(ItemDetail::new(item_id, format!("Mock item {}", item_id))),
        }
    }

    async fn check_stock(
        &self,
        item_id: &str,
        quantity: u32,
        area_id: &str,
    ) -> Result<bool, PlatformError> {
        let mut state = self.record(PlatformCall::CheckStock {
            item_id: item_id.to_string(),
            quantity,
            area_id: area_id.to_string(),
        });
        if state.panic_on_stock_check {
            drop(state);
            panic!("mock stock check panicked");
        }
        state.stock.pop_front().unwrap_or(Ok(false))
    }

    async fn clear_cart(&self) -> Result<(), PlatformError> {
        drop(self.record(PlatformCall::ClearCart));
        Ok(())
    }

    async fn add_to_cart(&self, item_id: &str, count: u32) -> Result<(), PlatformError> {
        let mut state = self.record(PlatformCall::AddToCart {
            item_id: item_id.to_string(),
            count,
        });
        if state.add_failures > 0 {
            state.add_failures -= 1;
            if let Some(e) = &state.add_error {
                return Err(e.clone());
            }
        }
        Ok(())
    }

    async fn submit_order(&self) -> Result<bool, PlatformError> {
        let mut state = self.record(PlatformCall::SubmitOrder);
        state.submissions.pop_front().unwrap_or(Ok(false))
    }

    fn set_payment_password(&self, password: Option<String>) {
        self.state().payment_password = password;
    }
}
