//! Static configuration loaded once at startup
//!
//! This configuration is read-only after the daemon starts.

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::types::ControllerEndpoint;

/// Bridge server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address the REST surface binds to
    pub hostname: String,
    /// Port the REST surface listens on
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            hostname: "127.0.0.1".to_string(),
            port: 3080,
        }
    }
}

/// Fan controller configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ControllerConfig {
    /// Controller address, `host` or `host:port`
    pub endpoint: String,
    /// Transport timeout in seconds for a single controller request
    #[serde(default = "default_communication_timeout")]
    pub communication_timeout: u64,
    /// Manufacturer reported in the accessory information service
    #[serde(default = "default_manufacturer")]
    pub manufacturer: String,
}

fn default_communication_timeout() -> u64 {
    5
}

fn default_manufacturer() -> String {
    "QuietCool".to_string()
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            endpoint: "192.168.1.100".to_string(),
            communication_timeout: default_communication_timeout(),
            manufacturer: default_manufacturer(),
        }
    }
}

impl ControllerConfig {
    /// Parse the configured endpoint
    pub fn endpoint(&self) -> Result<ControllerEndpoint> {
        self.endpoint.parse()
    }
}

/// Static configuration for the QuietCool bridge daemon.
///
/// Loaded once at startup and immutable during runtime.
/// Located at `~/.config/quietcool/config.toml` by default.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StaticConfig {
    /// REST surface configuration (bind address, port)
    #[serde(default)]
    pub server: ServerConfig,

    /// Controller configuration (endpoint, timeout, manufacturer)
    #[serde(default)]
    pub controller: ControllerConfig,
}

impl StaticConfig {
    /// Parse StaticConfig from TOML string.
    pub fn from_toml(content: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Serialize StaticConfig to TOML string.
    pub fn to_toml(&self) -> std::result::Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}
