//! API request handlers for the bridge REST surface.
//!
//! - [`info`]: service identification and bridge status
//! - [`accessories`]: published accessories and their characteristics
//!
//! Handlers take `State<AppState>` and return
//! `Result<Json<ApiResponse<T>>, ApiError>`.

pub mod accessories;
pub mod info;
