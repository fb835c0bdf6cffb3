//! Controller client contract
//!
//! Every operation is a single request/response against the controller.
//! Implementations never retry; retry policy belongs to the caller.

use async_trait::async_trait;
use quietcool_core::{
    ControllerEndpoint, DeviceDescriptor, DeviceId, DeviceInfo, DeviceStatus, QuietCoolError,
    Result, POWER_OFF_STATUS, POWER_ON_STATUS,
};
use serde_json::json;
use tokio::sync::mpsc;

/// Buffer size of the device enumeration channel
pub const LIST_CHANNEL_CAPACITY: usize = 16;

/// One event of a device enumeration
#[derive(Debug)]
pub enum ListEvent {
    /// A device and its discovery-time snapshot
    Found(DeviceDescriptor),
    /// A single device (or the listing itself) could not be read
    Failed {
        uid: Option<String>,
        error: QuietCoolError,
    },
    /// The controller has reported every device
    Complete,
}

/// State-changing command sent to a fan
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControllerCommand {
    Power { uid: String, on: bool },
    Speed { uid: String, code: u32 },
}

impl ControllerCommand {
    /// Target device uid
    pub fn uid(&self) -> &str {
        match self {
            ControllerCommand::Power { uid, .. } | ControllerCommand::Speed { uid, .. } => uid,
        }
    }

    /// JSON body of the control request
    pub fn body(&self) -> serde_json::Value {
        match self {
            ControllerCommand::Power { on, .. } => {
                let onoff = if *on {
                    POWER_ON_STATUS
                } else {
                    POWER_OFF_STATUS
                };
                json!({ "onoff": onoff })
            }
            ControllerCommand::Speed { code, .. } => json!({ "speed": code.to_string() }),
        }
    }
}

/// Async access to a fan controller
///
/// A single client is shared by every adapter created from one discovery
/// cycle. It holds no per-device state.
#[async_trait]
pub trait ControllerClient: Send + Sync {
    /// Enumerate every fan behind `endpoint` with its info and status.
    ///
    /// The stream ends with [`ListEvent::Complete`] once enumeration is
    /// done. A stream that closes without it was aborted.
    fn list_devices_with_info(&self, endpoint: &ControllerEndpoint) -> mpsc::Receiver<ListEvent>;

    /// Read device information (name, model, power status)
    async fn get_device_info(&self, id: &DeviceId) -> Result<DeviceInfo>;

    /// Read control status (speed code, capability code)
    async fn get_device_status(&self, id: &DeviceId) -> Result<DeviceStatus>;

    /// Turn the fan on or off
    async fn set_power(&self, id: &DeviceId, on: bool) -> Result<()>;

    /// Select a speed tier by protocol code
    async fn set_speed(&self, id: &DeviceId, code: u32) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_power_command_body() {
        let cmd = ControllerCommand::Power {
            uid: "abc".to_string(),
            on: true,
        };
        assert_eq!(cmd.uid(), "abc");
        assert_eq!(cmd.body(), json!({ "onoff": "1" }));

        let cmd = ControllerCommand::Power {
            uid: "abc".to_string(),
            on: false,
        };
        assert_eq!(cmd.body(), json!({ "onoff": "0" }));
    }

    #[test]
    fn test_speed_command_body() {
        let cmd = ControllerCommand::Speed {
            uid: "abc".to_string(),
            code: 3,
        };
        assert_eq!(cmd.body(), json!({ "speed": "3" }));
    }
}
