use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::Result;

pub const DEFAULT_NAME: &str = "Midea Thermostat";
pub const DEFAULT_HOST: &str = "192.168.1.200";
pub const DEFAULT_PORT: u16 = 80;
pub const DEFAULT_SCAN_INTERVAL_SECS: u64 = 10;
pub const DEFAULT_POLL_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_COMMAND_TIMEOUT_SECS: u64 = 5;

/// Controller connection settings, usually read from YAML:
///
/// ```yaml
/// name: ccm15
/// host: 192.168.1.50
/// port: 80
/// scan_interval: 10
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub name: String,
    pub host: String,
    pub port: u16,
    /// Seconds between polls.
    pub scan_interval: u64,
    /// Seconds before a status fetch is abandoned.
    pub poll_timeout: u64,
    /// Seconds before a control request is abandoned.
    pub command_timeout: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            name: DEFAULT_NAME.to_string(),
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            scan_interval: DEFAULT_SCAN_INTERVAL_SECS,
            poll_timeout: DEFAULT_POLL_TIMEOUT_SECS,
            command_timeout: DEFAULT_COMMAND_TIMEOUT_SECS,
        }
    }
}

impl Config {
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&text)
    }

    pub fn scan_interval(&self) -> Duration {
        Duration::from_secs(self.scan_interval)
    }

    pub fn poll_timeout(&self) -> Duration {
        Duration::from_secs(self.poll_timeout)
    }

    pub fn command_timeout(&self) -> Duration {
        Duration::from_secs(self.command_timeout)
    }
}
