//! quietcool-controller
//!
//! Client side of the QuietCool controller protocol. Bridge code talks to
//! controllers only through the [`ControllerClient`] trait.
//!
//! Public API:
//! - `client::ControllerClient`: async contract for listing and driving fans
//! - `http_client::HttpControllerClient`: JSON-over-HTTP implementation
//! - `mock::MockController`: in-memory controller for mock mode and tests

pub mod client;
pub mod http_client;
pub mod mock;

pub use client::{ControllerClient, ControllerCommand, ListEvent};
pub use http_client::HttpControllerClient;
pub use mock::{MockController, MockFan};
