//! In-process peer transport over tokio channels.

use std::collections::HashMap;

use parking_lot::RwLock;
use tokio::sync::mpsc;

use crate::domain::{PeerId, RelayError};
use crate::ports::outbound::PeerTransport;

/// Transport that delivers alert payloads over per-peer unbounded channels.
///
/// Each connected peer owns the receiving end of its channel. Stands in for
/// the host's P2P session layer in tests and single-process setups; a real
/// node implements [`PeerTransport`] over its own wire protocol.
#[derive(Default)]
pub struct ChannelTransport {
    peers: RwLock<HashMap<PeerId, mpsc::UnboundedSender<Vec<u8>>>>,
}

impl ChannelTransport {
    /// Creates a transport with no peers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a peer and hands back the receiving end of its channel.
    pub fn connect(&self, peer: PeerId) -> mpsc::UnboundedReceiver<Vec<u8>> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.peers.write().insert(peer, tx);
        rx
    }

    /// Deregisters a peer. Sends to it fail afterward.
    pub fn disconnect(&self, peer: &PeerId) {
        self.peers.write().remove(peer);
    }
}

impl PeerTransport for ChannelTransport {
    fn connected_peers(&self) -> Vec<PeerId> {
        self.peers.read().keys().copied().collect()
    }

    fn send_alert(&self, peer: PeerId, payload: &[u8]) -> Result<(), RelayError> {
        let peers = self.peers.read();
        let sender = peers.get(&peer).ok_or(RelayError::PeerUnreachable(peer))?;
        sender
            .send(payload.to_vec())
            .map_err(|_| RelayError::PeerUnreachable(peer))
    }
}
