//! Poller timing configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::PollPolicy;

/// Timing and retry budgets for the pollers.
///
/// The defaults follow the platform: a login QR code stays valid for about
/// 170 seconds, and a contested order usually goes through within a few
/// quick resubmissions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollerConfig {
    /// Ticket polls before the QR code counts as expired.
    #[serde(default = "default_login_max_attempts")]
    pub login_max_attempts: u32,

    /// Delay between ticket polls (seconds).
    #[serde(default = "default_login_interval")]
    pub login_interval_secs: u64,

    /// Order submissions per availability window.
    #[serde(default = "default_submit_max_attempts")]
    pub submit_max_attempts: u32,

    /// Delay between order submissions (seconds).
    #[serde(default = "default_submit_interval")]
    pub submit_interval_secs: u64,
}

fn default_login_max_attempts() -> u32 {
    85
}

fn default_login_interval() -> u64 {
    2
}

fn default_submit_max_attempts() -> u32 {
    3
}

fn default_submit_interval() -> u64 {
    5
}

impl PollerConfig {
    pub fn login_policy(&self) -> PollPolicy {
        PollPolicy::bounded(
            Duration::from_secs(self.login_interval_secs),
            self.login_max_attempts,
        )
    }

    pub fn submit_policy(&self) -> PollPolicy {
        PollPolicy::bounded(
            Duration::from_secs(self.submit_interval_secs),
            self.submit_max_attempts,
        )
    }
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            login_max_attempts: default_login_max_attempts(),
            login_interval_secs: default_login_interval(),
            submit_max_attempts: default_submit_max_attempts(),
            submit_interval_secs: default_submit_interval(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = PollerConfig::default();
        assert_eq!(config.login_max_attempts, 85);
        assert_eq!(config.login_interval_secs, 2);
        assert_eq!(config.submit_max_attempts, 3);
        assert_eq!(config.submit_interval_secs, 5);
    }

    #[test]
    fn test_deserialize_partial() {
        let toml = r#"
            submit_max_attempts = 5
        "#;
        let config: PollerConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.submit_max_attempts, 5);
        assert_eq!(config.login_max_attempts, 85);
        assert_eq!(config.submit_interval_secs, 5);
    }

    #[test]
    fn test_policies() {
        let config = PollerConfig::default();

        let login = config.login_policy();
        assert_eq!(login.interval, Duration::from_secs(2));
        assert_eq!(login.max_attempts, Some(85));

        let submit = config.submit_policy();
        assert_eq!(submit.interval, Duration::from_secs(5));
        assert_eq!(submit.max_attempts, Some(3));
    }
}
