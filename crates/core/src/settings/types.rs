use serde::{Deserialize, Serialize};

use super::SettingsError;
use crate::poller::{TaskParameters, MAX_COUNT, MAX_POLL_INTERVAL_SECS};

/// Stored user preferences.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub item_id: String,

    #[serde(default)]
    pub area_id: String,

    #[serde(default = "default_count")]
    pub count: u32,

    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,

    /// Needed when the order is paid with stored balance.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_password: Option<String>,
}

fn default_count() -> u32 {
    1
}

fn default_poll_interval() -> u64 {
    3
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            item_id: String::new(),
            area_id: String::new(),
            count: default_count(),
            poll_interval_secs: default_poll_interval(),
            payment_password: None,
        }
    }
}

impl Settings {
    /// Build the task for an acquisition from these settings.
    pub fn task_parameters(&self) -> Result<TaskParameters, SettingsError> {
        self.validate()?;
        let params = TaskParameters::new(
            self.item_id.trim(),
            self.area_id.trim(),
            self.count,
            self.poll_interval_secs,
        );
        params
            .validate()
            .map_err(|e| SettingsError::Invalid(e.to_string()))?;
        Ok(params)
    }

    /// Record the task of a started acquisition. The password is kept.
    pub fn apply_task(&mut self, params: &TaskParameters) {
        self.item_id = params.item_id.clone();
        self.area_id = params.area_id.clone();
        self.count = params.count;
        self.poll_interval_secs = params.poll_interval_secs;
    }

    /// Check the ranges the settings form allows.
    pub fn validate(&self) -> Result<(), SettingsError> {
        if !(1..=MAX_COUNT).contains(&self.count) {
            return Err(SettingsError::Invalid(format!(
                "count must be between 1 and {}",
                MAX_COUNT
            )));
        }
        if !(1..=MAX_POLL_INTERVAL_SECS).contains(&self.poll_interval_secs) {
            return Err(SettingsError::Invalid(format!(
                "poll interval must be between 1 and {} seconds",
                MAX_POLL_INTERVAL_SECS
            )));
        }
        Ok(())
    }

    /// Copy with the payment password masked, for display.
    pub fn redacted(&self) -> Self {
        Self {
            payment_password: self.payment_password.as_ref().map(|_| "***".to_string()),
            ..self.clone()
        }
    }
}
