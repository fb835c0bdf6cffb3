//! Bridge-side host
//!
//! [`BridgeHost`] hands out services to adapters. [`AccessoryRegistry`]
//! keeps every published accessory with its services so the REST surface
//! can reach the registered characteristic handlers.

use crate::adapter::FanAdapter;
use quietcool_core::api::{AccessoryResponse, ServiceResponse};
use quietcool_core::host::{
    Characteristic, CharacteristicValue, HostApi, RegisteredCharacteristic, Service, ServiceKind,
};
use quietcool_core::{QuietCoolError, Result};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info};

/// Host that assigns increasing instance ids to the services it creates
#[derive(Debug)]
pub struct BridgeHost {
    next_iid: AtomicU64,
}

impl BridgeHost {
    pub fn new() -> Self {
        Self {
            next_iid: AtomicU64::new(1),
        }
    }
}

impl Default for BridgeHost {
    fn default() -> Self {
        Self::new()
    }
}

impl HostApi for BridgeHost {
    fn create_service(&self, kind: ServiceKind, display_name: &str) -> Service {
        let iid = self.next_iid.fetch_add(1, Ordering::Relaxed);
        debug!("Created {:?} service '{}' (iid {})", kind, display_name, iid);
        Service::new(iid, kind, display_name)
    }
}

/// A published accessory: the adapter plus the services it built
#[derive(Debug)]
pub struct Accessory {
    adapter: Arc<FanAdapter>,
    services: Vec<Service>,
}

impl Accessory {
    pub fn adapter(&self) -> &Arc<FanAdapter> {
        &self.adapter
    }

    pub fn services(&self) -> &[Service] {
        &self.services
    }

    fn registered(&self, characteristic: Characteristic) -> Option<&RegisteredCharacteristic> {
        self.services
            .iter()
            .find_map(|service| service.handler(characteristic))
    }

    fn fixed(&self, characteristic: Characteristic) -> Option<&CharacteristicValue> {
        self.services
            .iter()
            .find_map(|service| service.value(characteristic))
    }

    fn unsupported(&self, characteristic: Characteristic) -> QuietCoolError {
        QuietCoolError::Unsupported(format!(
            "accessory {} has no {} characteristic",
            self.adapter.uid(),
            characteristic
        ))
    }

    /// Read a characteristic: registered handlers first, then fixed values
    pub async fn read(&self, characteristic: Characteristic) -> Result<CharacteristicValue> {
        if let Some(registered) = self.registered(characteristic) {
            return registered.read().await;
        }
        self.fixed(characteristic)
            .cloned()
            .ok_or_else(|| self.unsupported(characteristic))
    }

    /// Write a characteristic through its registered set handler
    pub async fn write(
        &self,
        characteristic: Characteristic,
        value: CharacteristicValue,
    ) -> Result<()> {
        match self.registered(characteristic) {
            Some(registered) => registered.write(value).await,
            None => Err(self.unsupported(characteristic)),
        }
    }

    pub fn to_response(&self) -> AccessoryResponse {
        AccessoryResponse {
            uid: self.adapter.uid().to_string(),
            name: self.adapter.name().to_string(),
            model: self.adapter.model().to_string(),
            multi_speed: self.adapter.is_multi_speed(),
            services: self.services.iter().map(ServiceResponse::from).collect(),
        }
    }
}

/// Every published accessory, in discovery order
#[derive(Debug, Default)]
pub struct AccessoryRegistry {
    accessories: Vec<Accessory>,
}

impl AccessoryRegistry {
    /// Build services for each adapter and publish them
    pub fn publish(host: &dyn HostApi, adapters: &[Arc<FanAdapter>]) -> Self {
        let accessories: Vec<Accessory> = adapters
            .iter()
            .map(|adapter| Accessory {
                adapter: Arc::clone(adapter),
                services: adapter.services(host),
            })
            .collect();

        info!("Published {} accessories", accessories.len());
        Self { accessories }
    }

    pub fn len(&self) -> usize {
        self.accessories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accessories.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Accessory> {
        self.accessories.iter()
    }

    /// Look up an accessory by device uid
    pub fn get(&self, uid: &str) -> Result<&Accessory> {
        self.accessories
            .iter()
            .find(|accessory| accessory.adapter.uid() == uid)
            .ok_or_else(|| QuietCoolError::AccessoryNotFound(uid.to_string()))
    }
}
