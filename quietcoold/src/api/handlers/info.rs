//! Info handlers for bridge status and root endpoint

use crate::api::error::ApiError;
use crate::api::AppState;

use axum::{extract::State, Json};
use quietcool_core::api::{ApiResponse, InfoResponse};
use serde_json::{json, Value};
use tracing::debug;

/// Handle the root endpoint.
///
/// `GET /`
pub(crate) async fn root() -> Result<Json<ApiResponse<Value>>, ApiError> {
    debug!("Request: GET /");

    let data = json!({
        "service": "QuietCool Accessory Bridge",
        "version": env!("CARGO_PKG_VERSION"),
        "status": "ok"
    });

    Ok(Json(ApiResponse::success(data)))
}

/// Report version, controller, accessory count and uptime.
///
/// `GET /api/v0/info`
pub(crate) async fn get_info(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<InfoResponse>>, ApiError> {
    debug!("Request: GET /api/v0/info");

    let info = InfoResponse {
        version: env!("CARGO_PKG_VERSION").to_string(),
        controller: state.controller.clone(),
        accessory_count: state.registry.len(),
        mock: state.mock,
        uptime: state.start_time.elapsed().as_secs(),
    };

    crate::api_ok!(info)
}
