//! Fan device adapter
//!
//! One adapter per discovered fan. It translates host operations (power
//! flag, rotation speed percentage) into controller calls and back. The
//! adapter owns no device state: every get and set goes to the controller.
//!
//! Retry policy:
//! - status reads (`get_speed`) are repeated on transient failure, up to
//!   [`STATUS_READ_ATTEMPTS`] attempts in total
//! - info reads (`get_power`) are issued once
//! - writes (`set_power`, `set_speed`) are issued once, never repeated
//!
//! Operations against one adapter are not serialized. Callers that need
//! ordering between overlapping writes to the same fan must provide it.

use crate::retry::{retry_transient, STATUS_READ_ATTEMPTS};
use async_trait::async_trait;
use quietcool_controller::ControllerClient;
use quietcool_core::host::{
    Characteristic, CharacteristicHandler, CharacteristicProps, CharacteristicValue, HostApi,
    Service, ServiceKind,
};
use quietcool_core::{
    percentage_to_protocol_code, protocol_code_to_percentage, DeviceDescriptor, DeviceId,
    QuietCoolError, Result, SpeedLevel, SPEED_STEP,
};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, error, info, info_span, Instrument, Span};

/// Props of the rotation speed characteristic
pub const ROTATION_SPEED_PROPS: CharacteristicProps = CharacteristicProps {
    min_value: SpeedLevel::Off.percentage(),
    max_value: SpeedLevel::High.percentage(),
    min_step: SPEED_STEP,
};

/// Log a failed operation once, then hand the result back unchanged
fn logged<T>(operation: &'static str, result: Result<T>) -> Result<T> {
    if let Err(e) = &result {
        error!(operation, "Fan operation failed: {}", e);
    }
    result
}

/// Host-facing adapter for a single fan
pub struct FanAdapter {
    descriptor: DeviceDescriptor,
    client: Arc<dyn ControllerClient>,
    manufacturer: String,
    multi_speed: bool,
    span: Span,
}

impl FanAdapter {
    /// Bind an adapter to a discovered fan.
    ///
    /// The capability flag is taken from the descriptor here and never
    /// re-evaluated. Fails with [`QuietCoolError::InvalidDescriptor`] when
    /// the descriptor has no uid or no display name.
    pub fn new(
        descriptor: DeviceDescriptor,
        client: Arc<dyn ControllerClient>,
        manufacturer: impl Into<String>,
    ) -> Result<Self> {
        if descriptor.uid().trim().is_empty() {
            return Err(QuietCoolError::InvalidDescriptor(
                "device has no uid".to_string(),
            ));
        }
        if descriptor.name().trim().is_empty() {
            return Err(QuietCoolError::InvalidDescriptor(format!(
                "device {} has no name",
                descriptor.uid()
            )));
        }

        let span = info_span!("fan", name = %descriptor.name(), uid = %descriptor.uid());
        let multi_speed = descriptor.is_multi_speed();

        span.in_scope(|| info!(model = %descriptor.model(), multi_speed, "Initialized"));

        Ok(Self {
            descriptor,
            client,
            manufacturer: manufacturer.into(),
            multi_speed,
            span,
        })
    }

    pub fn id(&self) -> &DeviceId {
        &self.descriptor.id
    }

    pub fn uid(&self) -> &str {
        self.descriptor.uid()
    }

    pub fn name(&self) -> &str {
        self.descriptor.name()
    }

    pub fn model(&self) -> &str {
        self.descriptor.model()
    }

    pub fn is_multi_speed(&self) -> bool {
        self.multi_speed
    }

    /// Discovery-time snapshot this adapter was built from
    pub fn descriptor(&self) -> &DeviceDescriptor {
        &self.descriptor
    }

    fn require_multi_speed(&self) -> Result<()> {
        if self.multi_speed {
            Ok(())
        } else {
            Err(QuietCoolError::Unsupported(format!(
                "fan {} has no selectable speed",
                self.uid()
            )))
        }
    }

    /// Whether the controller reports the fan as on. Not retried.
    pub async fn get_power(&self) -> Result<bool> {
        async {
            let result = self
                .client
                .get_device_info(self.id())
                .await
                .map(|info| info.is_on());
            let on = logged("get_power", result)?;
            debug!(on, "Read power state");
            Ok(on)
        }
        .instrument(self.span.clone())
        .await
    }

    /// Switch the fan on or off. Not retried and not read back.
    pub async fn set_power(&self, on: bool) -> Result<()> {
        async {
            debug!(on, "Setting power");
            logged("set_power", self.client.set_power(self.id(), on).await)
        }
        .instrument(self.span.clone())
        .await
    }

    /// Current rotation speed as a host percentage.
    ///
    /// The status read is retried on transient failure; an unmapped speed
    /// code fails immediately.
    pub async fn get_speed(&self) -> Result<u32> {
        async {
            let result = async {
                self.require_multi_speed()?;
                let status = retry_transient(STATUS_READ_ATTEMPTS, "get_speed", || {
                    self.client.get_device_status(self.id())
                })
                .await?;
                protocol_code_to_percentage(status.speed)
            }
            .await;

            let percentage = logged("get_speed", result)?;
            debug!(percentage, "Read rotation speed");
            Ok(percentage)
        }
        .instrument(self.span.clone())
        .await
    }

    /// Select the speed tier for a host percentage. Not retried.
    pub async fn set_speed(&self, percentage: u32) -> Result<()> {
        async {
            let result = async {
                self.require_multi_speed()?;
                let code = percentage_to_protocol_code(percentage)?;
                debug!(percentage, code, "Setting rotation speed");
                self.client.set_speed(self.id(), code).await
            }
            .await;

            logged("set_speed", result)
        }
        .instrument(self.span.clone())
        .await
    }

    /// Build the accessory's services through the host.
    ///
    /// Returns the accessory information service followed by the fan
    /// service. Rotation speed is registered only for multi-speed fans.
    pub fn services(self: &Arc<Self>, host: &dyn HostApi) -> Vec<Service> {
        let mut information = host.create_service(ServiceKind::AccessoryInformation, self.name());
        information
            .set_characteristic(
                Characteristic::Name,
                CharacteristicValue::Text(self.name().to_string()),
            )
            .set_characteristic(
                Characteristic::Manufacturer,
                CharacteristicValue::Text(self.manufacturer.clone()),
            )
            .set_characteristic(
                Characteristic::Model,
                CharacteristicValue::Text(self.model().to_string()),
            );

        let mut fan = host.create_service(ServiceKind::Fan, self.name());
        fan.register(
            Characteristic::On,
            None,
            Arc::new(PowerHandler(Arc::clone(self))),
        );
        if self.multi_speed {
            fan.register(
                Characteristic::RotationSpeed,
                Some(ROTATION_SPEED_PROPS),
                Arc::new(SpeedHandler(Arc::clone(self))),
            );
        }

        self.span.in_scope(|| {
            info!(
                multi_speed = self.multi_speed,
                "Done with initialization"
            )
        });

        vec![information, fan]
    }
}

impl fmt::Debug for FanAdapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FanAdapter")
            .field("id", self.id())
            .field("name", &self.name())
            .field("multi_speed", &self.multi_speed)
            .finish_non_exhaustive()
    }
}

/// Get/set endpoints of the `On` characteristic
struct PowerHandler(Arc<FanAdapter>);

#[async_trait]
impl CharacteristicHandler for PowerHandler {
    async fn get(&self, _characteristic: Characteristic) -> Result<CharacteristicValue> {
        self.0.get_power().await.map(CharacteristicValue::Bool)
    }

    async fn set(&self, _characteristic: Characteristic, value: CharacteristicValue) -> Result<()> {
        self.0.set_power(value.as_bool()?).await
    }
}

/// Get/set endpoints of the `RotationSpeed` characteristic
struct SpeedHandler(Arc<FanAdapter>);

#[async_trait]
impl CharacteristicHandler for SpeedHandler {
    async fn get(&self, _characteristic: Characteristic) -> Result<CharacteristicValue> {
        self.0.get_speed().await.map(CharacteristicValue::Percentage)
    }

    async fn set(&self, _characteristic: Characteristic, value: CharacteristicValue) -> Result<()> {
        self.0.set_speed(value.as_percentage()?).await
    }
}
