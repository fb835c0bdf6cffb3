//! REST surface of the bridge
//!
//! Exposes the published accessories and routes characteristic reads and
//! writes to the handlers the adapters registered.

pub(crate) mod handlers;

use crate::host::AccessoryRegistry;
use axum::{
    extract::DefaultBodyLimit,
    http::Method,
    routing::get,
    Router,
};
use std::sync::Arc;
use std::time::Instant;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::{DefaultOnFailure, TraceLayer},
};
use tracing::{info, Level};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    /// Published accessories
    pub registry: Arc<AccessoryRegistry>,
    /// Controller the accessories were discovered on
    pub controller: String,
    /// Whether the simulated controller is in use
    pub mock: bool,
    /// Server start time for uptime calculation
    pub start_time: Instant,
}

impl AppState {
    pub fn new(registry: AccessoryRegistry, controller: impl Into<String>, mock: bool) -> Self {
        Self {
            registry: Arc::new(registry),
            controller: controller.into(),
            mock,
            start_time: Instant::now(),
        }
    }
}

/// Create the API router with all endpoints
pub fn create_router(state: AppState) -> Router {
    info!("Setting up API router...");

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any);

    let middleware_stack = ServiceBuilder::new()
        // The failing operation already logged at error level
        .layer(TraceLayer::new_for_http().on_failure(DefaultOnFailure::new().level(Level::WARN)))
        .layer(cors)
        .layer(DefaultBodyLimit::max(1024 * 1024)); // 1MB limit

    Router::new()
        // Accessory endpoints
        .route(
            "/api/v0/accessories",
            get(handlers::accessories::list_accessories),
        )
        .route(
            "/api/v0/accessories/:uid",
            get(handlers::accessories::get_accessory),
        )
        .route(
            "/api/v0/accessories/:uid/:characteristic",
            get(handlers::accessories::get_characteristic)
                .post(handlers::accessories::set_characteristic),
        )
        // System info endpoint
        .route("/api/v0/info", get(handlers::info::get_info))
        // Root endpoint
        .route("/", get(handlers::info::root))
        .layer(middleware_stack)
        .with_state(state)
}

/// Error handling utilities
pub(crate) mod error {
    use axum::{
        http::StatusCode,
        response::{IntoResponse, Response},
        Json,
    };
    use quietcool_core::{api::ApiResponse, QuietCoolError};
    use tracing::warn;

    /// Error returned by handlers
    #[derive(Debug)]
    pub struct ApiError {
        pub status_code: StatusCode,
        pub message: String,
    }

    impl ApiError {
        pub fn new(status_code: StatusCode, message: impl Into<String>) -> Self {
            Self {
                status_code,
                message: message.into(),
            }
        }

        pub fn bad_request(message: impl Into<String>) -> Self {
            Self::new(StatusCode::BAD_REQUEST, message)
        }

        pub fn not_found(message: impl Into<String>) -> Self {
            Self::new(StatusCode::NOT_FOUND, message)
        }

        pub fn internal_error(message: impl Into<String>) -> Self {
            Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
        }

        /// The controller could not be reached or rejected the request
        pub fn service_unavailable(message: impl Into<String>) -> Self {
            Self::new(StatusCode::SERVICE_UNAVAILABLE, message)
        }
    }

    impl IntoResponse for ApiError {
        fn into_response(self) -> Response {
            warn!("API Error {}: {}", self.status_code, self.message);

            let response: ApiResponse<()> = ApiResponse::error(self.message);

            (self.status_code, Json(response)).into_response()
        }
    }

    impl From<QuietCoolError> for ApiError {
        fn from(err: QuietCoolError) -> Self {
            let message = err.to_string();
            match err {
                QuietCoolError::AccessoryNotFound(_) | QuietCoolError::Unsupported(_) => {
                    Self::not_found(message)
                }
                QuietCoolError::InvalidInput(_) | QuietCoolError::UnmappedValue { .. } => {
                    Self::bad_request(message)
                }
                QuietCoolError::Protocol(_) => Self::service_unavailable(message),
                _ => Self::internal_error(message),
            }
        }
    }

}

/// Wrap handler data in a success envelope
#[macro_export]
macro_rules! api_ok {
    ($data:expr) => {
        Ok(axum::Json(quietcool_core::api::ApiResponse::success($data)))
    };
}
