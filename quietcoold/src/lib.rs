//! QuietCool accessory bridge
//!
//! Discovers the fans behind a QuietCool controller, wraps each in a
//! [`adapter::FanAdapter`] and publishes them as smart accessories over a
//! REST surface.
//!
//! Startup order:
//! 1. [`discovery::Platform::accessories`] runs one discovery cycle
//! 2. [`host::AccessoryRegistry::publish`] builds every accessory's services
//! 3. [`api::create_router`] serves the registry

pub mod adapter;
pub mod api;
pub mod config;
pub mod discovery;
pub mod host;
pub mod retry;
pub mod shutdown;

#[cfg(test)]
pub(crate) mod test_utils;

pub use adapter::FanAdapter;
pub use discovery::{discover_all, DiscoveryReport, Platform};
pub use host::{AccessoryRegistry, BridgeHost};
