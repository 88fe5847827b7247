//! # Domain Layer for Alert Relay
//!
//! Pure relay state and configuration with no I/O dependencies.
//!
//! ## Contents
//!
//! - **value_objects**: `PeerId`, `RelayConfig`, per-peer delivery records,
//!   metrics counters
//! - **errors**: `RelayError`

mod errors;
mod value_objects;

pub use errors::*;
pub use value_objects::*;
