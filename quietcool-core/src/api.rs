//! API models for the bridge REST surface
//!
//! This module contains request and response models for the accessory API.

use crate::host::{
    Characteristic, CharacteristicProps, CharacteristicValue, Service, ServiceKind,
};
use serde::{Deserialize, Serialize};

/// Generic API response wrapper
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status")]
pub enum ApiResponse<T> {
    #[serde(rename = "success")]
    Success { data: T },
    #[serde(rename = "error")]
    Error { error: String },
}

impl<T> ApiResponse<T> {
    /// Create a successful response
    pub fn success(data: T) -> Self {
        Self::Success { data }
    }

    /// Create an error response
    pub fn error(error: String) -> Self {
        Self::Error { error }
    }
}

/// Bridge information response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InfoResponse {
    /// Bridge version
    pub version: String,
    /// Controller the accessories were discovered on
    pub controller: String,
    /// Number of published accessories
    pub accessory_count: usize,
    /// Whether the simulated controller is in use
    pub mock: bool,
    /// Bridge uptime in seconds
    pub uptime: u64,
}

/// A registered characteristic as seen by API clients
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CharacteristicResponse {
    pub characteristic: Characteristic,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub props: Option<CharacteristicProps>,
    pub readable: bool,
    pub writable: bool,
}

/// One service of an accessory
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceResponse {
    pub iid: u64,
    pub kind: ServiceKind,
    pub name: String,
    /// Fixed values such as name, manufacturer and model
    pub values: Vec<(Characteristic, CharacteristicValue)>,
    /// Characteristics with live get/set handlers
    pub characteristics: Vec<CharacteristicResponse>,
}

impl From<&Service> for ServiceResponse {
    fn from(service: &Service) -> Self {
        Self {
            iid: service.iid(),
            kind: service.kind(),
            name: service.name().to_string(),
            values: service.values().to_vec(),
            characteristics: service
                .registered()
                .iter()
                .map(|registered| CharacteristicResponse {
                    characteristic: registered.characteristic(),
                    props: registered.props(),
                    readable: true,
                    writable: true,
                })
                .collect(),
        }
    }
}

/// A published accessory
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccessoryResponse {
    pub uid: String,
    pub name: String,
    pub model: String,
    pub multi_speed: bool,
    pub services: Vec<ServiceResponse>,
}

/// All published accessories, in discovery order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessoryListResponse {
    pub accessories: Vec<AccessoryResponse>,
}

/// Current value of one characteristic
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CharacteristicValueResponse {
    pub uid: String,
    pub characteristic: Characteristic,
    pub value: CharacteristicValue,
}

/// Request body for writing a characteristic
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetCharacteristicRequest {
    pub value: CharacteristicValue,
}
