//! Value objects for relay configuration and per-peer delivery state.

use std::collections::{HashMap, HashSet};
use std::fmt;

use klaxon_core::alert::AlertId;
use klaxon_core::signing::NetworkEnvironment;

/// Peer identifier for the alert dissemination layer.
///
/// A 32-byte identifier assigned by the transport, typically derived from
/// the peer's session key or node id. The relay only uses it to address
/// deliveries and track per-peer state.
///
/// # Example
///
/// ```rust
/// use klaxon_relay::domain::PeerId;
///
/// let peer = PeerId::new([0xAB; 32]);
/// let peer_from_bytes = PeerId::from_bytes(&[0xAB; 32]).unwrap();
/// assert_eq!(peer, peer_from_bytes);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PeerId(pub [u8; 32]);

impl PeerId {
    /// Creates a new peer id from a 32-byte array.
    pub fn new(id: [u8; 32]) -> Self {
        Self(id)
    }

    /// Creates a peer id from a byte slice.
    ///
    /// Returns `None` unless the slice is exactly 32 bytes.
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        if bytes.len() == 32 {
            let mut id = [0u8; 32];
            id.copy_from_slice(bytes);
            Some(Self(id))
        } else {
            None
        }
    }
}

impl fmt::Display for PeerId {
    /// Short hex prefix, enough to tell peers apart in logs.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(&self.0[..4]))
    }
}

/// Alert relay configuration.
///
/// There is no `Default`: the network environment selects which signing
/// keys are trusted, and silently defaulting it is how test alerts end up
/// on the main network.
#[derive(Clone, Debug)]
pub struct RelayConfig {
    /// Which network's alert keys to trust.
    pub environment: NetworkEnvironment,
    /// Protocol version this node reports when querying applicable alerts.
    pub node_version: u32,
    /// Client sub-version string this node reports.
    pub node_sub_version: String,
    /// Interval between expiry sweeps and re-flood passes, in milliseconds.
    pub sweep_interval_ms: u64,
    /// Poll interval while waiting for the first peer, in milliseconds.
    pub peer_poll_interval_ms: u64,
}

impl RelayConfig {
    /// Configuration with standard intervals for the given environment.
    pub fn new(environment: NetworkEnvironment) -> Self {
        Self {
            environment,
            node_version: 70001,
            node_sub_version: String::new(),
            sweep_interval_ms: 30_000,
            peer_poll_interval_ms: 500,
        }
    }
}

/// Per-peer record of which alert contents have been delivered.
///
/// Keyed by content hash rather than alert id: a superseding alert reuses
/// its predecessor's id but must still reach every peer.
#[derive(Debug, Default)]
pub struct SentRecords {
    sent: HashMap<PeerId, HashSet<[u8; 32]>>,
}

impl SentRecords {
    /// Creates an empty record set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks an alert content as delivered to a peer.
    pub fn record(&mut self, peer: PeerId, alert_hash: [u8; 32]) {
        self.sent.entry(peer).or_default().insert(alert_hash);
    }

    /// Whether a peer already received this exact alert content.
    pub fn was_sent(&self, peer: &PeerId, alert_hash: &[u8; 32]) -> bool {
        self.sent
            .get(peer)
            .map(|hashes| hashes.contains(alert_hash))
            .unwrap_or(false)
    }

    /// Drops all records for a departed peer, so a reconnect starts fresh.
    pub fn forget_peer(&mut self, peer: &PeerId) {
        self.sent.remove(peer);
    }
}

/// Counters exposed by the relay service.
#[derive(Clone, Debug, Default)]
pub struct RelayMetrics {
    /// Alerts the store accepted (new or superseding content).
    pub alerts_accepted: u64,
    /// Alerts the store rejected.
    pub alerts_rejected: u64,
    /// Individual peer deliveries.
    pub deliveries: u64,
    /// Sends the transport refused; not retried within the same pass.
    pub send_failures: u64,
    /// Alerts transitioned to Expired by sweeps.
    pub alerts_expired: u64,
}

/// Outcome of an operator broadcast.
#[derive(Clone, Debug)]
pub struct BroadcastReport {
    /// Id of the broadcast alert.
    pub alert_id: AlertId,
    /// Peers that took delivery during the initial flood.
    pub peers_reached: usize,
    /// Ids the acceptance cancelled.
    pub cancelled: Vec<AlertId>,
}
