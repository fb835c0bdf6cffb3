//! In-memory controller
//!
//! Simulates a controller with a fixed set of fans. Used by the daemon's
//! mock mode and by tests, which can script failures and inspect every
//! request the controller saw.

use crate::client::{ControllerClient, ControllerCommand, ListEvent};
use async_trait::async_trait;
use quietcool_core::{
    ControllerEndpoint, DeviceDescriptor, DeviceId, DeviceInfo, DeviceStatus, QuietCoolError,
    Result, MULTI_SPEED_SEQUENCE, POWER_OFF_STATUS, POWER_ON_STATUS,
};
use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tokio::sync::mpsc;
use tracing::debug;

/// Capability code the mock uses for on/off-only fans
const SINGLE_SPEED_SEQUENCE: &str = "4";

/// A simulated fan
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockFan {
    pub uid: String,
    pub name: String,
    pub model: String,
    pub sequence: String,
    pub on: bool,
    pub speed: u32,
}

impl MockFan {
    /// A fan with selectable speed tiers, off, at the low tier
    pub fn multi_speed(uid: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            name: name.into(),
            model: "QuietCool Multi-Speed".to_string(),
            sequence: MULTI_SPEED_SEQUENCE.to_string(),
            on: false,
            speed: 1,
        }
    }

    /// An on/off-only fan, off
    pub fn single_speed(uid: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            name: name.into(),
            model: "QuietCool Single-Speed".to_string(),
            sequence: SINGLE_SPEED_SEQUENCE.to_string(),
            on: false,
            speed: 3,
        }
    }

    fn info(&self) -> DeviceInfo {
        DeviceInfo {
            uid: self.uid.clone(),
            name: self.name.clone(),
            model: self.model.clone(),
            status: if self.on {
                POWER_ON_STATUS
            } else {
                POWER_OFF_STATUS
            }
            .to_string(),
            details: HashMap::new(),
        }
    }

    fn status(&self) -> DeviceStatus {
        DeviceStatus {
            uid: self.uid.clone(),
            speed: self.speed,
            sequence: self.sequence.clone(),
            details: HashMap::new(),
        }
    }

    /// Discovery snapshot of this fan as reported behind `endpoint`
    pub fn descriptor(&self, endpoint: &ControllerEndpoint) -> DeviceDescriptor {
        DeviceDescriptor {
            id: DeviceId::new(endpoint.clone(), self.uid.clone()),
            info: self.info(),
            status: self.status(),
        }
    }
}

#[derive(Debug, Default)]
struct MockState {
    fans: Vec<MockFan>,
    failing_info_reads: u32,
    failing_status_reads: u32,
    failing_writes: u32,
    failing_listings: HashSet<String>,
    abort_listing: bool,
    info_reads: u32,
    status_reads: u32,
    commands: Vec<ControllerCommand>,
}

impl MockState {
    fn fan_mut(&mut self, uid: &str) -> Result<&mut MockFan> {
        self.fans
            .iter_mut()
            .find(|fan| fan.uid == uid)
            .ok_or_else(|| QuietCoolError::Protocol(format!("Unknown device: {}", uid)))
    }

    /// Consume one scripted failure from `counter`, if any remain
    fn take_failure(counter: &mut u32, what: &str) -> Result<()> {
        if *counter > 0 {
            *counter -= 1;
            return Err(QuietCoolError::Protocol(format!(
                "Simulated {} failure",
                what
            )));
        }
        Ok(())
    }
}

/// Simulated controller
#[derive(Debug, Default)]
pub struct MockController {
    state: Mutex<MockState>,
}

impl MockController {
    /// Create a controller with the given fans, in listing order
    pub fn new(fans: Vec<MockFan>) -> Self {
        Self {
            state: Mutex::new(MockState {
                fans,
                ..Default::default()
            }),
        }
    }

    /// Two demo fans: one multi-speed, one on/off only
    pub fn demo() -> Self {
        Self::new(vec![
            MockFan::multi_speed("A1B2C3", "Whole House Fan"),
            MockFan::single_speed("D4E5F6", "Attic Fan"),
        ])
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Fail the next `count` device info reads
    pub fn fail_info_reads(&self, count: u32) {
        self.state().failing_info_reads = count;
    }

    /// Fail the next `count` status reads
    pub fn fail_status_reads(&self, count: u32) {
        self.state().failing_status_reads = count;
    }

    /// Fail the next `count` power/speed commands
    pub fn fail_writes(&self, count: u32) {
        self.state().failing_writes = count;
    }

    /// Report a per-item failure for `uid` during enumeration
    pub fn fail_listing_of(&self, uid: impl Into<String>) {
        self.state().failing_listings.insert(uid.into());
    }

    /// End enumeration without the completion signal
    pub fn abort_listing(&self) {
        self.state().abort_listing = true;
    }

    /// Override the speed code a fan reports
    pub fn set_reported_speed(&self, uid: &str, code: u32) -> Result<()> {
        self.state().fan_mut(uid)?.speed = code;
        Ok(())
    }

    /// Current simulated state of a fan
    pub fn fan(&self, uid: &str) -> Option<MockFan> {
        self.state().fans.iter().find(|fan| fan.uid == uid).cloned()
    }

    /// Number of info reads attempted, including failed ones
    pub fn info_reads(&self) -> u32 {
        self.state().info_reads
    }

    /// Number of status reads attempted, including failed ones
    pub fn status_reads(&self) -> u32 {
        self.state().status_reads
    }

    /// Every command attempted, including failed ones
    pub fn commands(&self) -> Vec<ControllerCommand> {
        self.state().commands.clone()
    }

    fn apply(&self, command: ControllerCommand) -> Result<()> {
        let mut state = self.state();
        state.commands.push(command.clone());
        MockState::take_failure(&mut state.failing_writes, "write")?;

        match command {
            ControllerCommand::Power { uid, on } => state.fan_mut(&uid)?.on = on,
            ControllerCommand::Speed { uid, code } => state.fan_mut(&uid)?.speed = code,
        }
        Ok(())
    }
}

#[async_trait]
impl ControllerClient for MockController {
    fn list_devices_with_info(&self, endpoint: &ControllerEndpoint) -> mpsc::Receiver<ListEvent> {
        let state = self.state();
        let (tx, rx) = mpsc::channel(state.fans.len() + 1);

        for fan in &state.fans {
            let event = if state.failing_listings.contains(&fan.uid) {
                ListEvent::Failed {
                    uid: Some(fan.uid.clone()),
                    error: QuietCoolError::Protocol("Simulated listing failure".to_string()),
                }
            } else {
                ListEvent::Found(fan.descriptor(endpoint))
            };
            // Capacity covers every fan plus the completion event
            let _ = tx.try_send(event);
        }

        if state.abort_listing {
            debug!("Mock enumeration aborted before completion");
        } else {
            let _ = tx.try_send(ListEvent::Complete);
        }

        rx
    }

    async fn get_device_info(&self, id: &DeviceId) -> Result<DeviceInfo> {
        let mut state = self.state();
        state.info_reads += 1;
        MockState::take_failure(&mut state.failing_info_reads, "info read")?;
        Ok(state.fan_mut(&id.uid)?.info())
    }

    async fn get_device_status(&self, id: &DeviceId) -> Result<DeviceStatus> {
        let mut state = self.state();
        state.status_reads += 1;
        MockState::take_failure(&mut state.failing_status_reads, "status read")?;
        Ok(state.fan_mut(&id.uid)?.status())
    }

    async fn set_power(&self, id: &DeviceId, on: bool) -> Result<()> {
        self.apply(ControllerCommand::Power {
            uid: id.uid.clone(),
            on,
        })
    }

    async fn set_speed(&self, id: &DeviceId, code: u32) -> Result<()> {
        self.apply(ControllerCommand::Speed {
            uid: id.uid.clone(),
            code,
        })
    }
}
