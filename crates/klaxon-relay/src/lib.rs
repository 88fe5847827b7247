//! # Klaxon Relay
//!
//! Disseminates signed alerts across the peer network and keeps every
//! node's alert table converging on the same state.
//!
//! ## Architecture Role
//!
//! ```text
//! [Operator tooling] ──broadcast_alert──→ [AlertRelayService]
//!                                               │      ▲
//!                              flood / announce │      │ handle_alert
//!                                               ↓      │
//!                                        ┌──────┴──────┴──────┐
//!                                        ↓                    ↓
//!                                    [Peer A]             [Peer B] ...
//! ```
//!
//! The service implements both inbound ports:
//! - [`AlertRelayApi`]: operator-driven broadcast and queries
//! - [`AlertReceiver`]: alert traffic and peer lifecycle from the network
//!
//! It depends on two outbound ports (adapters in this crate, or supplied
//! by the host node):
//! - [`PeerTransport`]: delivery of encoded alerts to connected peers
//! - [`TimeSource`]: the clock driving window and expiry decisions
//!
//! The [`worker`] module provides the background task that sweeps expired
//! alerts and re-floods live ones on a timer.

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod service;
pub mod test_utils;
pub mod worker;

pub use domain::*;
pub use ports::inbound::{AlertReceiver, AlertRelayApi};
pub use ports::outbound::{PeerTransport, TimeSource};
pub use service::AlertRelayService;
