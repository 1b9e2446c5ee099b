//! Bounded poll-with-interval primitive shared by the pollers.

use std::future::Future;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

/// How often to poll and how many attempts to allow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    /// Delay after an attempt that produced nothing.
    pub interval: Duration,
    /// Attempt cap, `None` polls until cancelled.
    pub max_attempts: Option<u32>,
}

impl PollPolicy {
    pub fn bounded(interval: Duration, max_attempts: u32) -> Self {
        Self {
            interval,
            max_attempts: Some(max_attempts),
        }
    }

    pub fn unbounded(interval: Duration) -> Self {
        Self {
            interval,
            max_attempts: None,
        }
    }

    fn exhausted(&self, attempts: u32) -> bool {
        self.max_attempts.is_some_and(|max| attempts >= max)
    }
}

/// Result of [`poll_until`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome<T> {
    /// An attempt produced a value.
    Ready { value: T, attempts: u32 },
    /// The attempt cap was reached without a value.
    Exhausted { attempts: u32 },
    /// Cancellation was observed before the next attempt.
    Cancelled { attempts: u32 },
}

impl<T> PollOutcome<T> {
    pub fn attempts(&self) -> u32 {
        match self {
            Self::Ready { attempts, .. }
            | Self::Exhausted { attempts }
            | Self::Cancelled { attempts } => *attempts,
        }
    }
}

/// Run `attempt` until it yields a value, the policy's attempt cap is hit, or
/// `cancel` fires.
///
/// The token is checked before every attempt, so no attempt starts once
/// cancellation has been observed. A running attempt is never interrupted;
/// only the sleep between attempts wakes early on cancellation. Without a
/// token the loop cannot be cancelled. No sleep follows the final attempt of a
/// bounded policy.
///
/// `attempt` receives the 1-based attempt number.
pub async fn poll_until<T, F, Fut>(
    policy: &PollPolicy,
    cancel: Option<&CancellationToken>,
    mut attempt: F,
) -> PollOutcome<T>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Option<T>>,
{
    let mut attempts = 0;
    loop {
        if cancel.is_some_and(CancellationToken::is_cancelled) {
            return PollOutcome::Cancelled { attempts };
        }

        attempts += 1;
        if let Some(value) = attempt(attempts).await {
            return PollOutcome::Ready { value, attempts };
        }

        if policy.exhausted(attempts) {
            return PollOutcome::Exhausted { attempts };
        }

        match cancel {
            Some(token) => {
                tokio::select! {
                    _ = token.cancelled() => {}
                    _ = tokio::time::sleep(policy.interval) => {}
                }
            }
            None => tokio::time::sleep(policy.interval).await,
        }
    }
}
