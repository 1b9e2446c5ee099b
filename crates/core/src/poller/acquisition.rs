//! Purchase worker.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::{
    poll_until, AcquisitionOutcome, PollOutcome, PollPolicy, PollerConfig, TaskParameters,
};
use crate::events::{EventHandle, PollerEvent};
use crate::metrics;
use crate::session::Session;

/// Availability is always probed for a single unit.
const PROBE_QUANTITY: u32 = 1;

/// Polls item availability and places the order once stock shows up.
///
/// Each availability window gets a fresh cart: the cart is cleared, refilled
/// with the requested count and the order is submitted with a bounded burst of
/// retries. An exhausted burst goes back to polling. The only terminal states
/// are a placed order and cancellation.
///
/// Cancellation is checked at the top of every availability check. A
/// submission burst in progress always runs to completion.
pub struct AcquisitionPoller {
    session: Arc<Session>,
    events: EventHandle,
    cancel: CancellationToken,
    params: TaskParameters,
    submit_policy: PollPolicy,
}

impl AcquisitionPoller {
    pub fn new(
        session: Arc<Session>,
        events: EventHandle,
        cancel: CancellationToken,
        params: TaskParameters,
        config: &PollerConfig,
    ) -> Self {
        Self {
            session,
            events,
            cancel,
            params,
            submit_policy: config.submit_policy(),
        }
    }

    /// Run until the order is placed or the poller is cancelled.
    pub async fn run(self) -> AcquisitionOutcome {
        if self.cancel.is_cancelled() {
            return self.finish_cancelled(0);
        }

        info!(
            "Watching {} (area {}, count {}, every {}s)",
            self.params.item_id,
            self.params.area_id,
            self.params.count,
            self.params.poll_interval_secs
        );

        match self.session.refresh_item_detail(&self.params.item_id).await {
            Ok(detail) => debug!("Loaded item detail: {}", detail.name),
            Err(e) => {
                warn!("Failed to load item detail for {}: {}", self.params.item_id, e);
                self.events.emit(PollerEvent::ItemDetailUnavailable {
                    item_id: self.params.item_id.clone(),
                    error: e.to_string(),
                });
            }
        }

        let policy = PollPolicy::unbounded(self.params.poll_interval());
        let polled =
            poll_until(&policy, Some(&self.cancel), |check| self.check_and_buy(check)).await;

        match polled {
            PollOutcome::Ready {
                value: submit_attempts,
                attempts,
            } => {
                info!(
                    "Order placed for {} after {} checks",
                    self.params.item_id, attempts
                );
                metrics::PURCHASE_OUTCOMES
                    .with_label_values(&["purchased"])
                    .inc();
                self.events.emit(PollerEvent::Purchased {
                    item_id: self.params.item_id.clone(),
                    count: self.params.count,
                    submit_attempts,
                });
                AcquisitionOutcome::Purchased { submit_attempts }
            }
            PollOutcome::Cancelled { attempts } | PollOutcome::Exhausted { attempts } => {
                self.finish_cancelled(attempts)
            }
        }
    }

    fn finish_cancelled(&self, checks: u32) -> AcquisitionOutcome {
        info!(
            "Acquisition of {} cancelled after {} checks",
            self.params.item_id, checks
        );
        metrics::PURCHASE_OUTCOMES
            .with_label_values(&["cancelled"])
            .inc();
        self.events.emit(PollerEvent::PurchaseCancelled);
        AcquisitionOutcome::Cancelled
    }

    /// One outer iteration. Returns the number of submissions it took when the
    /// order went through.
    async fn check_and_buy(&self, check: u32) -> Option<u32> {
        let item_id = &self.params.item_id;
        let retry_in_secs = self.params.poll_interval_secs;

        let available = self
            .session
            .check_availability(item_id, PROBE_QUANTITY, &self.params.area_id)
            .await;
        match available {
            Ok(true) => {
                metrics::STOCK_CHECKS.with_label_values(&["in_stock"]).inc();
            }
            Ok(false) => {
                metrics::STOCK_CHECKS
                    .with_label_values(&["out_of_stock"])
                    .inc();
                debug!("{} not available (check {})", item_id, check);
                self.events.emit(PollerEvent::Waiting {
                    item_id: item_id.clone(),
                    retry_in_secs,
                    reason: None,
                });
                return None;
            }
            Err(e) => {
                metrics::STOCK_CHECKS.with_label_values(&["error"]).inc();
                warn!("Stock check {} for {} failed: {}", check, item_id, e);
                self.events.emit(PollerEvent::Waiting {
                    item_id: item_id.clone(),
                    retry_in_secs,
                    reason: Some(e.to_string()),
                });
                return None;
            }
        }

        let name = match self.session.cached_item_detail(item_id).await {
            Some(detail) => detail.name,
            None => item_id.clone(),
        };
        info!("{} is available, ordering {}", name, self.params.count);
        self.events.emit(PollerEvent::Attempting {
            item_id: item_id.clone(),
            count: self.params.count,
        });

        if let Err(e) = self.session.clear_cart().await {
            warn!("Failed to clear cart: {}", e);
        }
        if let Err(e) = self.session.add_to_cart(item_id, self.params.count).await {
            warn!("Failed to add {} to cart: {}", item_id, e);
            self.events.emit(PollerEvent::CartRejected {
                item_id: item_id.clone(),
                error: e.to_string(),
                retry_in_secs,
            });
            return None;
        }

        match self.submit_burst().await {
            PollOutcome::Ready { attempts, .. } => Some(attempts),
            PollOutcome::Exhausted { attempts } | PollOutcome::Cancelled { attempts } => {
                warn!(
                    "Order for {} failed after {} attempts, back to polling",
                    item_id, attempts
                );
                self.events.emit(PollerEvent::SubmissionExhausted {
                    item_id: item_id.clone(),
                    attempts,
                    retry_in_secs,
                });
                None
            }
        }
    }

    /// Submit the order up to the burst budget. Runs without the cancellation
    /// token.
    async fn submit_burst(&self) -> PollOutcome<()> {
        poll_until(&self.submit_policy, None, |attempt| async move {
            match self.session.submit_order().await {
                Ok(true) => {
                    metrics::ORDER_SUBMISSIONS
                        .with_label_values(&["accepted"])
                        .inc();
                    Some(())
                }
                Ok(false) => {
                    metrics::ORDER_SUBMISSIONS
                        .with_label_values(&["declined"])
                        .inc();
                    debug!("Order submission {} declined", attempt);
                    None
                }
                Err(e) => {
                    metrics::ORDER_SUBMISSIONS.with_label_values(&["error"]).inc();
                    warn!("Order submission {} failed: {}", attempt, e);
                    None
                }
            }
        })
        .await
    }
}
