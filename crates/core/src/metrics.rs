//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Login (ticket polls, outcomes)
//! - Acquisition (stock checks, order submissions, outcomes)
//! - Status events relayed to observers

use once_cell::sync::Lazy;
use prometheus::{IntCounter, IntCounterVec, IntGauge, Opts};

// =============================================================================
// Login Metrics
// =============================================================================

/// Ticket polls issued while waiting for a QR scan.
pub static TICKET_POLLS: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "snapcart_ticket_polls_total",
        "Total login ticket polls",
    )
    .unwrap()
});

/// Login attempts by result.
pub static LOGIN_OUTCOMES: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("snapcart_login_outcomes_total", "Login runs by result"),
        &["result"], // "authenticated", "expired", "invalid", "cancelled"
    )
    .unwrap()
});

// =============================================================================
// Acquisition Metrics
// =============================================================================

/// Stock checks by result.
pub static STOCK_CHECKS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("snapcart_stock_checks_total", "Total stock checks"),
        &["result"], // "in_stock", "out_of_stock", "error"
    )
    .unwrap()
});

/// Order submissions by result.
pub static ORDER_SUBMISSIONS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("snapcart_order_submissions_total", "Total order submissions"),
        &["result"], // "accepted", "declined", "error"
    )
    .unwrap()
});

/// Acquisition runs by result.
pub static PURCHASE_OUTCOMES: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("snapcart_purchase_outcomes_total", "Acquisition runs by result"),
        &["result"], // "purchased", "cancelled"
    )
    .unwrap()
});

/// Whether a flow is currently running (0 or 1).
pub static FLOW_RUNNING: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new("snapcart_flow_running", "Whether a flow is running").unwrap()
});

// =============================================================================
// Event Metrics
// =============================================================================

/// Status events relayed to observers by type.
pub static STATUS_EVENTS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("snapcart_status_events_total", "Status events relayed"),
        &["type"],
    )
    .unwrap()
});

/// All core metrics, for registration with the server's registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        Box::new(TICKET_POLLS.clone()),
        Box::new(LOGIN_OUTCOMES.clone()),
        Box::new(STOCK_CHECKS.clone()),
        Box::new(ORDER_SUBMISSIONS.clone()),
        Box::new(PURCHASE_OUTCOMES.clone()),
        Box::new(FLOW_RUNNING.clone()),
        Box::new(STATUS_EVENTS.clone()),
    ]
}
