//! Ports layer for the alert relay subsystem.
//!
//! Defines the hexagonal architecture port traits:
//! - Inbound (driving) ports: API exposed to operator tooling and the
//!   network layer
//! - Outbound (driven) ports: dependencies on the transport and the clock

pub mod inbound;
pub mod outbound;

pub use inbound::*;
pub use outbound::*;
