use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr};
use std::path::PathBuf;

use crate::platform::SimulatedPlatformConfig;
use crate::poller::PollerConfig;

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub polling: PollerConfig,
    #[serde(default)]
    pub settings: SettingsConfig,
    #[serde(default)]
    pub platform: PlatformConfig,
}

/// Control server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> IpAddr {
    IpAddr::V4(Ipv4Addr::LOCALHOST)
}

fn default_port() -> u16 {
    8090
}

/// Where user preferences are stored
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SettingsConfig {
    #[serde(default = "default_settings_path")]
    pub path: PathBuf,
}

impl Default for SettingsConfig {
    fn default() -> Self {
        Self {
            path: default_settings_path(),
        }
    }
}

fn default_settings_path() -> PathBuf {
    PathBuf::from("settings.toml")
}

/// Platform backend configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct PlatformConfig {
    #[serde(default)]
    pub backend: PlatformBackend,
    /// Script for the simulated backend
    #[serde(default)]
    pub simulated: SimulatedPlatformConfig,
}

/// Available platform backends
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PlatformBackend {
    #[default]
    Simulated,
    // Future: a real HTTP backend for the retail platform
}

/// Config view for API responses
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub server: ServerConfig,
    pub polling: PollerConfig,
    pub settings: SettingsConfig,
    pub platform: SanitizedPlatformConfig,
}

#[derive(Debug, Clone, Serialize)]
pub struct SanitizedPlatformConfig {
    pub backend: PlatformBackend,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        Self {
            server: config.server.clone(),
            polling: config.polling.clone(),
            settings: config.settings.clone(),
            platform: SanitizedPlatformConfig {
                backend: config.platform.backend,
            },
        }
    }
}
