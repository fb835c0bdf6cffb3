//! QuietCool Core Library
//!
//! Shared types, models, and utilities for the QuietCool accessory bridge.
//! This crate is used by both the controller client and the bridge daemon.

pub mod api;
pub mod config;
pub mod error;
pub mod host;
pub mod speed;
pub mod types;

// Re-export commonly used types
pub use config::{default_config_path, ControllerConfig, ServerConfig, StaticConfig};
pub use error::*;
pub use speed::{
    percentage_to_protocol_code, protocol_code_to_percentage, SpeedLevel, SPEED_STEP,
};
pub use types::*;
