use thiserror::Error;

use super::Settings;
use crate::poller::TaskParameters;

/// Errors from loading, saving or validating settings.
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Failed to read settings: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse settings: {0}")]
    Parse(String),

    #[error("Failed to serialize settings: {0}")]
    Serialize(String),

    #[error("Invalid settings: {0}")]
    Invalid(String),
}

/// Where user preferences live.
pub trait SettingsStore: Send + Sync {
    /// Load stored settings, defaults when nothing is stored yet.
    fn load(&self) -> Result<Settings, SettingsError>;

    fn save(&self, settings: &Settings) -> Result<(), SettingsError>;

    /// Record the task of a started acquisition.
    fn save_task(&self, params: &TaskParameters) -> Result<(), SettingsError> {
        let mut settings = self.load()?;
        settings.apply_task(params);
        self.save(&settings)
    }
}
