//! Inbound ports (API) for the alert relay subsystem.

use klaxon_core::alert::{AlertId, SignedAlert};
use klaxon_core::store::AlertStatus;

use crate::domain::{BroadcastReport, PeerId, RelayError, RelayMetrics};

/// Primary API for operator-driven alert dissemination.
pub trait AlertRelayApi: Send + Sync {
    /// Admits a signed alert locally and floods it to connected peers.
    ///
    /// The alert is self-checked first: it must survive an encode/decode
    /// round trip byte for byte and verify against the configured key ring,
    /// exactly as a receiving node would check it.
    fn broadcast_alert(&self, alert: SignedAlert) -> Result<BroadcastReport, RelayError>;

    /// Live alerts applicable to a node with the given protocol version and
    /// sub-version, highest priority first.
    fn active_alerts(&self, version: u32, sub_version: &str) -> Vec<SignedAlert>;

    /// Lifecycle state of an alert id.
    fn alert_status(&self, id: AlertId) -> AlertStatus;

    /// Snapshot of the relay counters.
    fn relay_metrics(&self) -> RelayMetrics;
}

/// Handle for alert traffic and peer lifecycle events from the network.
pub trait AlertReceiver: Send + Sync {
    /// Handles an encoded alert received from a peer.
    ///
    /// Accepted alerts are relayed onward to every other connected peer
    /// while inside their relay window. Rejections are returned to the
    /// caller, which owns any peer penalty policy.
    fn handle_alert(&self, source: PeerId, payload: &[u8]) -> Result<(), RelayError>;

    /// Registers a newly connected peer and delivers every live alert to
    /// it, including alerts past their flood window. Returns how many
    /// alerts were delivered.
    fn handle_peer_connected(&self, peer: PeerId) -> usize;

    /// Drops per-peer delivery state for a departed peer.
    fn handle_peer_disconnected(&self, peer: PeerId);
}
