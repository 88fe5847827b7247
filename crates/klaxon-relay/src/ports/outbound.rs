//! Outbound ports (SPI) for the alert relay subsystem.

use klaxon_core::alert::Timestamp;

use crate::domain::{PeerId, RelayError};

/// Peer transport interface for alert delivery.
///
/// Implemented by the host's P2P layer; this crate ships an in-process
/// channel adapter for tests and single-process setups.
pub trait PeerTransport: Send + Sync {
    /// Currently connected peers.
    fn connected_peers(&self) -> Vec<PeerId>;

    /// Sends an encoded alert to one peer.
    fn send_alert(&self, peer: PeerId, payload: &[u8]) -> Result<(), RelayError>;
}

/// Clock abstraction so window and expiry logic is testable without real
/// time.
pub trait TimeSource: Send + Sync {
    /// Current Unix timestamp in seconds.
    fn now(&self) -> Timestamp;
}
