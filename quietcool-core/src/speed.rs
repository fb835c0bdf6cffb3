//! Speed mapping table
//!
//! Fixed bidirectional map between the controller's speed codes and the
//! host-facing rotation speed percentage:
//!
//! | Level | Percentage | Protocol code |
//! |-------|-----------:|--------------:|
//! | Off   |          0 |             0 |
//! | Low   |         50 |             1 |
//! | High  |        100 |             3 |
//!
//! Off only exists on the host → controller path. The controller reports
//! "off" through the power flag, so code 0 has no inverse. Values outside
//! the table are rejected with [`QuietCoolError::UnmappedValue`], never
//! clamped to a neighbouring level.

use crate::error::{MappingDomain, QuietCoolError, Result};
use serde::{Deserialize, Serialize};

/// Granularity of the host rotation speed characteristic
pub const SPEED_STEP: u32 = 50;

/// Discrete fan speed tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpeedLevel {
    Off,
    Low,
    High,
}

impl SpeedLevel {
    /// Every level in ascending order
    pub const ALL: [SpeedLevel; 3] = [SpeedLevel::Off, SpeedLevel::Low, SpeedLevel::High];

    /// Levels the controller can report back as a speed
    pub const RUNNING: [SpeedLevel; 2] = [SpeedLevel::Low, SpeedLevel::High];

    /// Host-facing percentage for this level
    pub const fn percentage(self) -> u32 {
        match self {
            SpeedLevel::Off => 0,
            SpeedLevel::Low => 50,
            SpeedLevel::High => 100,
        }
    }

    /// Controller-native speed code for this level
    pub const fn protocol_code(self) -> u32 {
        match self {
            SpeedLevel::Off => 0,
            SpeedLevel::Low => 1,
            SpeedLevel::High => 3,
        }
    }

    /// Resolve a host percentage to a level
    pub fn from_percentage(percentage: u32) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|level| level.percentage() == percentage)
            .ok_or(QuietCoolError::UnmappedValue {
                domain: MappingDomain::Percentage,
                value: percentage,
            })
    }

    /// Resolve a controller-reported speed code to a level
    pub fn from_protocol_code(code: u32) -> Result<Self> {
        Self::RUNNING
            .into_iter()
            .find(|level| level.protocol_code() == code)
            .ok_or(QuietCoolError::UnmappedValue {
                domain: MappingDomain::ProtocolCode,
                value: code,
            })
    }
}

/// Map a host percentage (0, 50, 100) to the controller speed code
pub fn percentage_to_protocol_code(percentage: u32) -> Result<u32> {
    SpeedLevel::from_percentage(percentage).map(SpeedLevel::protocol_code)
}

/// Map a controller speed code (1, 3) to the host percentage
pub fn protocol_code_to_percentage(code: u32) -> Result<u32> {
    SpeedLevel::from_protocol_code(code).map(SpeedLevel::percentage)
}
