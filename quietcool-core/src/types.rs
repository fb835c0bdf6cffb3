//! Core types and data structures for QuietCool devices

use crate::error::{QuietCoolError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Value of `DeviceInfo::status` when the fan is powered on
pub const POWER_ON_STATUS: &str = "1";

/// Value of `DeviceInfo::status` when the fan is powered off
pub const POWER_OFF_STATUS: &str = "0";

/// Value of `DeviceStatus::sequence` for fans with selectable speed tiers
pub const MULTI_SPEED_SEQUENCE: &str = "1";

/// Network address of a fan controller
///
/// Accepts `host` or `host:port`. IPv6 addresses must be bracketed, as in
/// `[fe80::1]` or `[fe80::1]:8080`. Immutable once parsed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ControllerEndpoint {
    host: String,
    port: Option<u16>,
}

impl ControllerEndpoint {
    /// Create an endpoint from its parts
    pub fn new(host: impl Into<String>, port: Option<u16>) -> Result<Self> {
        let host = host.into();
        if host.trim().is_empty() {
            return Err(QuietCoolError::InvalidInput(
                "Controller host cannot be empty".to_string(),
            ));
        }
        Ok(Self { host, port })
    }

    /// Controller host name or IP address, without IPv6 brackets
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Explicit port, if one was given
    pub fn port(&self) -> Option<u16> {
        self.port
    }

    /// Base URL for HTTP requests against this controller
    pub fn base_url(&self) -> String {
        format!("http://{}", self)
    }
}

impl fmt::Display for ControllerEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.host.contains(':') {
            write!(f, "[{}]", self.host)?;
        } else {
            f.write_str(&self.host)?;
        }
        match self.port {
            Some(port) => write!(f, ":{}", port),
            None => Ok(()),
        }
    }
}

fn parse_port(port: &str) -> Result<u16> {
    port.parse::<u16>().map_err(|e| {
        QuietCoolError::InvalidInput(format!("Invalid controller port '{}': {}", port, e))
    })
}

impl FromStr for ControllerEndpoint {
    type Err = QuietCoolError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim().trim_start_matches("http://").trim_end_matches('/');

        if let Some(rest) = s.strip_prefix('[') {
            let (host, tail) = rest.split_once(']').ok_or_else(|| {
                QuietCoolError::InvalidInput(format!("Unterminated IPv6 address '{}'", s))
            })?;
            let port = match tail {
                "" => None,
                tail => match tail.strip_prefix(':') {
                    Some(port) => Some(parse_port(port)?),
                    None => {
                        return Err(QuietCoolError::InvalidInput(format!(
                            "Unexpected text after IPv6 address '{}'",
                            s
                        )))
                    }
                },
            };
            return Self::new(host, port);
        }

        match s.rsplit_once(':') {
            Some((host, _)) if host.contains(':') => Err(QuietCoolError::InvalidInput(format!(
                "IPv6 controller address '{}' must be bracketed, e.g. [{}]",
                s, s
            ))),
            Some((host, port)) => Self::new(host, Some(parse_port(port)?)),
            None => Self::new(s, None),
        }
    }
}

impl TryFrom<String> for ControllerEndpoint {
    type Error = QuietCoolError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<ControllerEndpoint> for String {
    fn from(endpoint: ControllerEndpoint) -> Self {
        endpoint.to_string()
    }
}

/// Identity of a physical fan: the controller it sits behind plus its uid
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DeviceId {
    /// Controller the fan is attached to
    pub endpoint: ControllerEndpoint,
    /// Controller-assigned unique identifier
    pub uid: String,
}

impl DeviceId {
    pub fn new(endpoint: ControllerEndpoint, uid: impl Into<String>) -> Self {
        Self {
            endpoint,
            uid: uid.into(),
        }
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.uid, self.endpoint)
    }
}

/// Device information as reported by the controller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceInfo {
    /// Controller-assigned unique identifier
    #[serde(default)]
    pub uid: String,
    /// Human-readable display name
    #[serde(default)]
    pub name: String,
    /// Model string
    #[serde(default)]
    pub model: String,
    /// Power status: "1" (on) or "0" (off)
    #[serde(deserialize_with = "deserialize_code_string")]
    pub status: String,
    /// Additional fields reported by the controller
    #[serde(flatten)]
    pub details: HashMap<String, serde_json::Value>,
}

impl DeviceInfo {
    /// Whether the controller reports the fan as powered on
    pub fn is_on(&self) -> bool {
        self.status == POWER_ON_STATUS
    }
}

/// Device control status as reported by the controller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceStatus {
    /// Controller-assigned unique identifier
    #[serde(default)]
    pub uid: String,
    /// Current protocol speed code
    #[serde(deserialize_with = "deserialize_speed_code")]
    pub speed: u32,
    /// Capability code; see [`MULTI_SPEED_SEQUENCE`]
    #[serde(deserialize_with = "deserialize_code_string")]
    pub sequence: String,
    /// Additional fields reported by the controller
    #[serde(flatten)]
    pub details: HashMap<String, serde_json::Value>,
}

impl DeviceStatus {
    /// Whether the capability code marks a variable speed fan
    pub fn is_multi_speed(&self) -> bool {
        self.sequence == MULTI_SPEED_SEQUENCE
    }
}

/// Discovery-time snapshot of a fan
///
/// Captured once when the device list is enumerated and never refreshed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceDescriptor {
    pub id: DeviceId,
    pub info: DeviceInfo,
    pub status: DeviceStatus,
}

impl DeviceDescriptor {
    /// Controller-assigned unique identifier
    pub fn uid(&self) -> &str {
        &self.id.uid
    }

    /// Human-readable display name
    pub fn name(&self) -> &str {
        &self.info.name
    }

    /// Model string
    pub fn model(&self) -> &str {
        &self.info.model
    }

    /// Whether the fan supports selectable speed tiers
    pub fn is_multi_speed(&self) -> bool {
        self.status.is_multi_speed()
    }
}

// Controllers report codes either as JSON strings ("1") or numbers (1)
fn deserialize_code_string<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::{self, Visitor};

    struct CodeVisitor;

    impl<'de> Visitor<'de> for CodeVisitor {
        type Value = String;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a string or integer code")
        }

        fn visit_str<E>(self, value: &str) -> std::result::Result<String, E>
        where
            E: de::Error,
        {
            Ok(value.to_string())
        }

        fn visit_u64<E>(self, value: u64) -> std::result::Result<String, E>
        where
            E: de::Error,
        {
            Ok(value.to_string())
        }

        fn visit_i64<E>(self, value: i64) -> std::result::Result<String, E>
        where
            E: de::Error,
        {
            Ok(value.to_string())
        }
    }

    deserializer.deserialize_any(CodeVisitor)
}

fn deserialize_speed_code<'de, D>(deserializer: D) -> std::result::Result<u32, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let code = deserialize_code_string(deserializer)?;
    code.trim()
        .parse::<u32>()
        .map_err(|e| serde::de::Error::custom(format!("invalid speed code '{}': {}", code, e)))
}
