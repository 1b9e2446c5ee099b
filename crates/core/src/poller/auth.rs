//! Login worker.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::{poll_until, AuthOutcome, PollOutcome, PollPolicy, PollerConfig};
use crate::events::{EventHandle, PollerEvent};
use crate::metrics;
use crate::session::Session;

/// Waits for the user to scan the login QR code, validates the resulting
/// ticket and marks the session authenticated.
///
/// Ticket fetch errors count as "no ticket yet". Cancellation is checked
/// before each ticket request; a request in flight is allowed to finish.
pub struct AuthPoller {
    session: Arc<Session>,
    events: EventHandle,
    cancel: CancellationToken,
    policy: PollPolicy,
}

impl AuthPoller {
    pub fn new(
        session: Arc<Session>,
        events: EventHandle,
        cancel: CancellationToken,
        config: &PollerConfig,
    ) -> Self {
        Self {
            session,
            events,
            cancel,
            policy: config.login_policy(),
        }
    }

    /// Run the login handshake to a terminal outcome.
    ///
    /// Emits exactly one terminal event.
    pub async fn run(self) -> AuthOutcome {
        info!("Waiting for login QR code scan");

        let session = &self.session;
        let polled = poll_until(&self.policy, Some(&self.cancel), |attempt| async move {
            metrics::TICKET_POLLS.inc();
            match session.fetch_ticket().await {
                Ok(ticket) => {
                    if ticket.is_none() {
                        debug!("No login ticket yet (attempt {})", attempt);
                    }
                    ticket
                }
                Err(e) => {
                    warn!("Ticket poll {} failed: {}", attempt, e);
                    None
                }
            }
        })
        .await;

        let outcome = match polled {
            PollOutcome::Ready { value: ticket, attempts } => {
                debug!("Got login ticket after {} polls", attempts);
                self.validate(&ticket).await
            }
            PollOutcome::Exhausted { attempts } => {
                info!("Login QR code expired after {} polls", attempts);
                self.events.emit(PollerEvent::LoginExpired { attempts });
                AuthOutcome::Expired
            }
            PollOutcome::Cancelled { attempts } => {
                info!("Login cancelled after {} polls", attempts);
                self.events.emit(PollerEvent::LoginCancelled);
                AuthOutcome::Cancelled
            }
        };

        let label = match outcome {
            AuthOutcome::Authenticated => "authenticated",
            AuthOutcome::Expired => "expired",
            AuthOutcome::Invalid => "invalid",
            AuthOutcome::Cancelled => "cancelled",
        };
        metrics::LOGIN_OUTCOMES.with_label_values(&[label]).inc();

        outcome
    }

    async fn validate(&self, ticket: &str) -> AuthOutcome {
        match self.session.validate_ticket(ticket).await {
            Ok(true) => {}
            Ok(false) => {
                warn!("Login ticket rejected");
                self.events.emit(PollerEvent::LoginInvalid);
                return AuthOutcome::Invalid;
            }
            Err(e) => {
                warn!("Login ticket validation failed: {}", e);
                self.events.emit(PollerEvent::LoginInvalid);
                return AuthOutcome::Invalid;
            }
        }

        self.session.mark_authenticated();
        if let Err(e) = self.session.persist_credentials().await {
            warn!("Failed to persist credentials: {}", e);
        }

        info!("Login confirmed");
        self.events.emit(PollerEvent::Authenticated);
        AuthOutcome::Authenticated
    }
}
