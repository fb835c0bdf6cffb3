//! Accessory handlers
//!
//! Reads and writes go straight to the characteristic handlers the fan
//! adapters registered, so every request reaches the controller.

use crate::api::error::ApiError;
use crate::api::AppState;
use crate::api_ok;

use axum::{
    extract::{Path, State},
    Json,
};
use quietcool_core::api::{
    AccessoryListResponse, AccessoryResponse, ApiResponse, CharacteristicValueResponse,
    SetCharacteristicRequest,
};
use quietcool_core::host::Characteristic;
use tracing::{debug, info};

/// List every published accessory in discovery order.
///
/// `GET /api/v0/accessories`
pub(crate) async fn list_accessories(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<AccessoryListResponse>>, ApiError> {
    debug!("Request: GET /api/v0/accessories");

    let accessories = state
        .registry
        .iter()
        .map(|accessory| accessory.to_response())
        .collect();

    api_ok!(AccessoryListResponse { accessories })
}

/// Describe one accessory.
///
/// `GET /api/v0/accessories/:uid`
pub(crate) async fn get_accessory(
    State(state): State<AppState>,
    Path(uid): Path<String>,
) -> Result<Json<ApiResponse<AccessoryResponse>>, ApiError> {
    debug!("Request: GET /api/v0/accessories/{}", uid);

    let accessory = state.registry.get(&uid)?;
    api_ok!(accessory.to_response())
}

/// Read a characteristic through its get handler.
///
/// `GET /api/v0/accessories/:uid/:characteristic`
pub(crate) async fn get_characteristic(
    State(state): State<AppState>,
    Path((uid, characteristic)): Path<(String, String)>,
) -> Result<Json<ApiResponse<CharacteristicValueResponse>>, ApiError> {
    debug!("Request: GET /api/v0/accessories/{}/{}", uid, characteristic);

    let characteristic: Characteristic = characteristic.parse()?;
    let accessory = state.registry.get(&uid)?;
    let value = accessory.read(characteristic).await?;

    api_ok!(CharacteristicValueResponse {
        uid,
        characteristic,
        value,
    })
}

/// Write a characteristic through its set handler.
///
/// `POST /api/v0/accessories/:uid/:characteristic` with `{"value": ...}`
pub(crate) async fn set_characteristic(
    State(state): State<AppState>,
    Path((uid, characteristic)): Path<(String, String)>,
    Json(request): Json<SetCharacteristicRequest>,
) -> Result<Json<ApiResponse<CharacteristicValueResponse>>, ApiError> {
    debug!(
        "Request: POST /api/v0/accessories/{}/{} {:?}",
        uid, characteristic, request.value
    );

    let characteristic: Characteristic = characteristic.parse()?;
    let accessory = state.registry.get(&uid)?;
    accessory
        .write(characteristic, request.value.clone())
        .await?;

    info!("Set {} on {} to {:?}", characteristic, uid, request.value);

    api_ok!(CharacteristicValueResponse {
        uid,
        characteristic,
        value: request.value,
    })
}
