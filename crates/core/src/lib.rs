//! Core of snapcart: the login and purchase pollers, the coordinator that
//! sequences them against a single platform session, and the status events
//! they report.

pub mod config;
pub mod coordinator;
pub mod events;
pub mod metrics;
pub mod platform;
pub mod poller;
pub mod session;
pub mod settings;
pub mod testing;

pub use config::{
    config_path, load_config, load_config_from_str, validate_config, Config, ConfigError,
    PlatformBackend, SanitizedConfig,
};
pub use coordinator::{
    Coordinator, CoordinatorError, CoordinatorStatus, FlowOutcome, FlowResult, FlowStatus,
};
pub use events::{
    create_event_channel, EventCategory, EventDispatcher, EventHandle, LogObserver, PollerEvent,
    StatusEvent, StatusObserver,
};
pub use platform::{ItemDetail, Platform, PlatformError, SimulatedPlatform, SimulatedPlatformConfig};
pub use poller::{
    AcquisitionOutcome, AcquisitionPoller, AuthOutcome, AuthPoller, PollerConfig, PollerKind,
    PollerState, TaskParameters,
};
pub use session::Session;
pub use settings::{Settings, SettingsError, SettingsStore, TomlSettingsStore};
