//! Configuration types for the QuietCool bridge
//!
//! Everything lives in a single static TOML file read once at startup.
//! No device state is ever written back; the file only describes where the
//! controller is and how the bridge serves its accessories.

mod paths;
mod static_config;

pub use paths::default_config_path;
pub use static_config::{ControllerConfig, ServerConfig, StaticConfig};
