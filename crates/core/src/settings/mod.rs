//! User preferences: what to buy and how.
//!
//! The surrounding application edits these and the coordinator records the
//! task of every started acquisition, so the next run starts from the last
//! used values.

mod store;
mod toml_store;
mod types;

pub use store::{SettingsError, SettingsStore};
pub use toml_store::TomlSettingsStore;
pub use types::Settings;
