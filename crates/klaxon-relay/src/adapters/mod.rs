//! Adapters layer for the alert relay subsystem.
//!
//! Concrete implementations of the outbound ports: the system clock and an
//! in-process channel transport.

pub mod time;
pub mod transport;

pub use time::SystemTimeSource;
pub use transport::ChannelTransport;
