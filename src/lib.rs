//! Library entry point for the canteen edge gate.
//!
//! Exports the route guard, the role/permission resolver and the supporting
//! modules for use by the binary and the integration tests.

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod logging;
pub mod roles;

pub use auth::*;
pub use config::GateConfig;
pub use error::*;
pub use logging::*;
pub use roles::*;
