//! Host accessory model
//!
//! The narrow slice of a smart-accessory host that a fan adapter needs:
//! building services and registering characteristic handlers on them.
//! Nothing else of the host is visible to the adapters.

use crate::error::{QuietCoolError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Characteristics a fan accessory can expose
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Characteristic {
    Name,
    Manufacturer,
    Model,
    On,
    RotationSpeed,
}

impl Characteristic {
    /// Path segment / wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            Characteristic::Name => "name",
            Characteristic::Manufacturer => "manufacturer",
            Characteristic::Model => "model",
            Characteristic::On => "on",
            Characteristic::RotationSpeed => "rotation_speed",
        }
    }
}

impl fmt::Display for Characteristic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Characteristic {
    type Err = QuietCoolError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "name" => Ok(Characteristic::Name),
            "manufacturer" => Ok(Characteristic::Manufacturer),
            "model" => Ok(Characteristic::Model),
            "on" => Ok(Characteristic::On),
            "rotation_speed" | "rotationspeed" => Ok(Characteristic::RotationSpeed),
            _ => Err(QuietCoolError::InvalidInput(format!(
                "Unknown characteristic: {}",
                s
            ))),
        }
    }
}

/// Value carried by a characteristic
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CharacteristicValue {
    Bool(bool),
    Percentage(u32),
    Text(String),
}

impl CharacteristicValue {
    /// Extract a boolean, rejecting other variants
    pub fn as_bool(&self) -> Result<bool> {
        match self {
            CharacteristicValue::Bool(b) => Ok(*b),
            other => Err(QuietCoolError::InvalidInput(format!(
                "Expected a boolean, got {:?}",
                other
            ))),
        }
    }

    /// Extract a percentage, rejecting other variants
    pub fn as_percentage(&self) -> Result<u32> {
        match self {
            CharacteristicValue::Percentage(p) => Ok(*p),
            other => Err(QuietCoolError::InvalidInput(format!(
                "Expected a percentage, got {:?}",
                other
            ))),
        }
    }
}

/// Value constraints advertised to the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharacteristicProps {
    pub min_value: u32,
    pub max_value: u32,
    pub min_step: u32,
}

/// Kinds of service a fan accessory publishes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceKind {
    AccessoryInformation,
    Fan,
}

/// Callback endpoint the host invokes for a registered characteristic
///
/// Calls against one accessory are not serialized by the host; overlapping
/// writes to the same physical fan have no ordering guarantee.
#[async_trait]
pub trait CharacteristicHandler: Send + Sync {
    /// Read the current value
    async fn get(&self, characteristic: Characteristic) -> Result<CharacteristicValue>;

    /// Apply a new value
    async fn set(&self, characteristic: Characteristic, value: CharacteristicValue) -> Result<()>;
}

/// A characteristic with live get/set handlers
#[derive(Clone)]
pub struct RegisteredCharacteristic {
    characteristic: Characteristic,
    props: Option<CharacteristicProps>,
    handler: Arc<dyn CharacteristicHandler>,
}

impl RegisteredCharacteristic {
    pub fn characteristic(&self) -> Characteristic {
        self.characteristic
    }

    pub fn props(&self) -> Option<CharacteristicProps> {
        self.props
    }

    /// Invoke the get handler
    pub async fn read(&self) -> Result<CharacteristicValue> {
        self.handler.get(self.characteristic).await
    }

    /// Invoke the set handler
    pub async fn write(&self, value: CharacteristicValue) -> Result<()> {
        self.handler.set(self.characteristic, value).await
    }
}

impl fmt::Debug for RegisteredCharacteristic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisteredCharacteristic")
            .field("characteristic", &self.characteristic)
            .field("props", &self.props)
            .finish_non_exhaustive()
    }
}

/// A host service: fixed values plus registered characteristics
#[derive(Debug, Clone)]
pub struct Service {
    iid: u64,
    kind: ServiceKind,
    name: String,
    values: Vec<(Characteristic, CharacteristicValue)>,
    registered: Vec<RegisteredCharacteristic>,
}

impl Service {
    /// Create an empty service. Hosts call this from [`HostApi::create_service`].
    pub fn new(iid: u64, kind: ServiceKind, name: impl Into<String>) -> Self {
        Self {
            iid,
            kind,
            name: name.into(),
            values: Vec::new(),
            registered: Vec::new(),
        }
    }

    /// Set a fixed characteristic value, replacing any previous one
    pub fn set_characteristic(
        &mut self,
        characteristic: Characteristic,
        value: CharacteristicValue,
    ) -> &mut Self {
        match self.values.iter_mut().find(|(c, _)| *c == characteristic) {
            Some(entry) => entry.1 = value,
            None => self.values.push((characteristic, value)),
        }
        self
    }

    /// Register get/set handlers for a characteristic
    pub fn register(
        &mut self,
        characteristic: Characteristic,
        props: Option<CharacteristicProps>,
        handler: Arc<dyn CharacteristicHandler>,
    ) -> &mut Self {
        self.registered
            .retain(|registered| registered.characteristic != characteristic);
        self.registered.push(RegisteredCharacteristic {
            characteristic,
            props,
            handler,
        });
        self
    }

    pub fn iid(&self) -> u64 {
        self.iid
    }

    pub fn kind(&self) -> ServiceKind {
        self.kind
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Fixed values in insertion order
    pub fn values(&self) -> &[(Characteristic, CharacteristicValue)] {
        &self.values
    }

    /// Look up a fixed value
    pub fn value(&self, characteristic: Characteristic) -> Option<&CharacteristicValue> {
        self.values
            .iter()
            .find(|(c, _)| *c == characteristic)
            .map(|(_, v)| v)
    }

    /// Registered characteristics in registration order
    pub fn registered(&self) -> &[RegisteredCharacteristic] {
        &self.registered
    }

    /// Look up a registered characteristic
    pub fn handler(&self, characteristic: Characteristic) -> Option<&RegisteredCharacteristic> {
        self.registered
            .iter()
            .find(|r| r.characteristic == characteristic)
    }
}

/// Service construction capability handed to adapters
pub trait HostApi: Send + Sync {
    /// Create an empty service of the given kind
    fn create_service(&self, kind: ServiceKind, display_name: &str) -> Service;
}
