//! Configuration loading.
//!
//! Sources are layered lowest to highest: built-in defaults, the TOML file,
//! then `SNAPCART_` environment variables. Nested keys in the environment are
//! separated by `__`, so `SNAPCART_POLLING__LOGIN_INTERVAL_SECS=3` sets
//! `polling.login_interval_secs`.

use figment::{
    providers::{Data, Env, Format, Serialized, Toml},
    Figment,
};
use std::path::{Path, PathBuf};

use super::{types::Config, ConfigError};

/// Prefix of environment variable overrides.
pub const ENV_PREFIX: &str = "SNAPCART_";

/// Environment variable naming the config file.
pub const CONFIG_PATH_ENV: &str = "SNAPCART_CONFIG";

/// Config file used when [`CONFIG_PATH_ENV`] is unset.
pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

/// Path of the config file, from the environment or the default.
pub fn config_path() -> PathBuf {
    std::env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

/// Load configuration from file with environment variable overrides
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::FileNotFound(path.display().to_string()));
    }

    extract(with_defaults(Toml::file(path)).merge(env_overrides()))
}

/// Load configuration from a TOML string, without environment overrides.
pub fn load_config_from_str(toml_str: &str) -> Result<Config, ConfigError> {
    extract(with_defaults(Toml::string(toml_str)))
}

fn with_defaults(source: Data<Toml>) -> Figment {
    Figment::from(Serialized::defaults(Config::default())).merge(source)
}

/// `SNAPCART_*` variables, minus the one that only locates the file.
fn env_overrides() -> Env {
    let path_key = &CONFIG_PATH_ENV[ENV_PREFIX.len()..];
    Env::prefixed(ENV_PREFIX).ignore(&[path_key]).split("__")
}

fn extract(figment: Figment) -> Result<Config, ConfigError> {
    figment
        .extract()
        .map_err(|e| ConfigError::ParseError(e.to_string()))
}
