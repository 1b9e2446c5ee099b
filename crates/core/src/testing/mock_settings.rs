//! In-memory settings store for testing.

use std::sync::{Mutex, MutexGuard};

use crate::settings::{Settings, SettingsError, SettingsStore};

#[derive(Debug, Default)]
struct StoreState {
    settings: Settings,
    saves: Vec<Settings>,
    fail_saves: bool,
}

/// Mock implementation of the SettingsStore trait.
///
/// Keeps settings in memory and records every save.
#[derive(Debug, Default)]
pub struct MockSettingsStore {
    state: Mutex<StoreState>,
}

impl MockSettingsStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_settings(settings: Settings) -> Self {
        let store = Self::default();
        store.state().settings = settings;
        store
    }

    fn state(&self) -> MutexGuard<'_, StoreState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Make every following save fail.
    pub fn fail_saves(&self) {
        self.state().fail_saves = true;
    }

    /// Settings passed to `save`, oldest first.
    pub fn saves(&self) -> Vec<Settings> {
        self.state().saves.clone()
    }

    pub fn current(&self) -> Settings {
        self.state().settings.clone()
    }
}

impl SettingsStore for MockSettingsStore {
    fn load(&self) -> Result<Settings, SettingsError> {
        Ok(self.current())
    }

    fn save(&self, settings: &Settings) -> Result<(), SettingsError> {
        let mut state = self.state();
        if state.fail_saves {
            return Err(SettingsError::Io(std::io::Error::new(
                std::io::ErrorKind::PermissionDenied,
                "read-only",
            )));
        }
        state.settings = settings.clone();
        state.saves.push(settings.clone());
        Ok(())
    }
}
