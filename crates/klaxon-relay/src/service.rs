//! # Alert Relay Service
//!
//! The main service implementation for alert dissemination.
//!
//! ## Architecture
//!
//! This service implements both inbound ports:
//! - [`AlertRelayApi`]: operator broadcast and alert queries
//! - [`AlertReceiver`]: alert traffic and peer lifecycle from the network
//!
//! It depends on two outbound ports:
//! - [`PeerTransport`]: delivery of encoded alerts to connected peers
//! - [`TimeSource`]: the clock driving window and expiry decisions
//!
//! ## Dissemination rules
//!
//! - Accepted alerts inside their relay window flood to every connected
//!   peer except the one that sent them to us.
//! - Past the relay window, live alerts are only delivered when a peer
//!   connects.
//! - Expired alerts are never sent.
//! - Each peer receives a given alert content at most once while connected;
//!   delivery records are dropped on disconnect.

use parking_lot::RwLock;
use std::sync::Arc;
use tracing::{debug, info, warn};

use klaxon_core::alert::{AlertId, RelayDecision, SignedAlert};
use klaxon_core::codec::{decode_signed, encode_signed};
use klaxon_core::signing::KeyRing;
use klaxon_core::store::{Accepted, AlertStatus, AlertStore};

use crate::domain::{BroadcastReport, PeerId, RelayConfig, RelayError, RelayMetrics, SentRecords};
use crate::ports::inbound::{AlertReceiver, AlertRelayApi};
use crate::ports::outbound::{PeerTransport, TimeSource};

/// Alert relay service.
///
/// Owns the alert store and the per-peer delivery records; every alert that
/// enters this node, whether from an operator or the network, passes
/// through [`AlertStore::submit`] before any dissemination.
///
/// ## Thread safety
///
/// The service is shared across async tasks via `Arc`. Internal state is
/// protected by `RwLock`; locks are never held across a transport call
/// boundary other than `send_alert`, which implementations must keep
/// non-blocking.
pub struct AlertRelayService<T, C>
where
    T: PeerTransport,
    C: TimeSource,
{
    /// Service configuration.
    config: RelayConfig,
    /// Trusted signing keys for the configured environment.
    keys: KeyRing,
    /// Verified alert table.
    store: RwLock<AlertStore>,
    /// Which alert contents each connected peer already has.
    sent: RwLock<SentRecords>,
    /// Peer transport adapter.
    transport: Arc<T>,
    /// Clock adapter.
    clock: Arc<C>,
    /// Relay counters.
    metrics: RwLock<RelayMetrics>,
}

impl<T, C> AlertRelayService<T, C>
where
    T: PeerTransport,
    C: TimeSource,
{
    /// Creates a relay service over the given transport and clock, trusting
    /// the keys in `keys`.
    pub fn new(config: RelayConfig, keys: KeyRing, transport: Arc<T>, clock: Arc<C>) -> Self {
        info!(
            "Alert relay created for {} network with {} trusted key(s)",
            config.environment,
            keys.len()
        );
        Self {
            config,
            keys,
            store: RwLock::new(AlertStore::new()),
            sent: RwLock::new(SentRecords::new()),
            transport,
            clock,
            metrics: RwLock::new(RelayMetrics::default()),
        }
    }

    /// The service configuration.
    pub fn config(&self) -> &RelayConfig {
        &self.config
    }

    /// Whether the transport currently reports any connected peer.
    pub fn has_peers(&self) -> bool {
        !self.transport.connected_peers().is_empty()
    }

    /// Runs an alert we authored through the checks a receiving node would
    /// apply: encode, decode, compare byte for byte, verify the signature.
    fn self_check(&self, alert: &SignedAlert) -> Result<(), RelayError> {
        let encoded = encode_signed(alert);
        let decoded = decode_signed(&encoded)
            .map_err(|err| RelayError::SelfVerificationFailed(err.to_string()))?;
        if decoded != *alert {
            return Err(RelayError::SelfVerificationFailed(
                "alert does not survive an encode/decode round trip".to_string(),
            ));
        }
        if !self.keys.verify(&alert.encoded_unsigned, &alert.signature) {
            return Err(RelayError::SelfVerificationFailed(format!(
                "signature does not verify against any {} network key",
                self.config.environment
            )));
        }
        Ok(())
    }

    /// Sends one alert to one peer unless that exact content was already
    /// delivered. Returns whether the peer took delivery.
    fn deliver(&self, peer: PeerId, alert: &SignedAlert, payload: &[u8]) -> bool {
        let hash = alert.hash();
        if self.sent.read().was_sent(&peer, &hash) {
            return false;
        }
        match self.transport.send_alert(peer, payload) {
            Ok(()) => {
                self.sent.write().record(peer, hash);
                self.metrics.write().deliveries += 1;
                true
            }
            Err(err) => {
                warn!("Failed to deliver alert {} to peer {}: {}", alert.id(), peer, err);
                self.metrics.write().send_failures += 1;
                false
            }
        }
    }

    /// Floods an alert to every connected peer except `exclude`. Returns
    /// how many peers took delivery.
    fn flood(&self, alert: &SignedAlert, exclude: Option<PeerId>) -> usize {
        let payload = encode_signed(alert);
        let mut reached = 0;
        for peer in self.transport.connected_peers() {
            if Some(peer) == exclude {
                continue;
            }
            if self.deliver(peer, alert, &payload) {
                reached += 1;
            }
        }
        reached
    }

    /// Shared admission path for operator and network alerts.
    fn submit_and_disseminate(
        &self,
        alert: SignedAlert,
        source: Option<PeerId>,
    ) -> Result<BroadcastReport, RelayError> {
        let now = self.clock.now();
        let id = alert.id();

        let accepted = match self.store.write().submit(alert.clone(), &self.keys, now) {
            Ok(accepted) => accepted,
            Err(rejection) => {
                self.metrics.write().alerts_rejected += 1;
                if source.is_none() {
                    warn!("Rejected operator alert {}: {}", id, rejection);
                }
                return Err(RelayError::Rejected(rejection));
            }
        };

        if !accepted.newly_inserted {
            debug!("Alert {} already known, not re-relaying", id);
            return Ok(BroadcastReport {
                alert_id: id,
                peers_reached: 0,
                cancelled: Vec::new(),
            });
        }

        self.metrics.write().alerts_accepted += 1;
        let Accepted { cancelled, .. } = accepted;
        if !cancelled.is_empty() {
            info!("Alert {} cancelled alert(s) {:?}", id, cancelled);
        }

        let peers_reached = match alert.relay_decision(now) {
            RelayDecision::Flood => self.flood(&alert, source),
            RelayDecision::Announce | RelayDecision::Suppress => 0,
        };
        info!(
            "Alert {} accepted, delivered to {} peer(s)",
            id, peers_reached
        );

        Ok(BroadcastReport {
            alert_id: id,
            peers_reached,
            cancelled,
        })
    }

    /// Live alerts that apply to this node's own version identity.
    pub fn applicable_alerts(&self) -> Vec<SignedAlert> {
        self.active_alerts(self.config.node_version, &self.config.node_sub_version)
    }

    /// Periodic maintenance: expires dead alerts and re-floods live ones to
    /// peers that have not received them yet. Returns how many deliveries
    /// the pass made.
    pub fn sweep_and_flood(&self) -> usize {
        let now = self.clock.now();

        let expired = self.store.write().sweep(now);
        if !expired.is_empty() {
            self.metrics.write().alerts_expired += expired.len() as u64;
            info!("Expired alert(s) {:?}", expired);
        }

        let flooding: Vec<SignedAlert> = self
            .store
            .read()
            .all_active(now)
            .into_iter()
            .filter(|alert| alert.relay_decision(now) == RelayDecision::Flood)
            .collect();

        let mut reached = 0;
        for alert in &flooding {
            reached += self.flood(alert, None);
        }
        reached
    }
}

impl<T, C> AlertRelayApi for AlertRelayService<T, C>
where
    T: PeerTransport,
    C: TimeSource,
{
    fn broadcast_alert(&self, alert: SignedAlert) -> Result<BroadcastReport, RelayError> {
        self.self_check(&alert)?;
        self.submit_and_disseminate(alert, None)
    }

    fn active_alerts(&self, version: u32, sub_version: &str) -> Vec<SignedAlert> {
        let now = self.clock.now();
        self.store.read().active_alerts(version, sub_version, now)
    }

    fn alert_status(&self, id: AlertId) -> AlertStatus {
        self.store.read().status(id)
    }

    fn relay_metrics(&self) -> RelayMetrics {
        self.metrics.read().clone()
    }
}

impl<T, C> AlertReceiver for AlertRelayService<T, C>
where
    T: PeerTransport,
    C: TimeSource,
{
    fn handle_alert(&self, source: PeerId, payload: &[u8]) -> Result<(), RelayError> {
        let alert = match decode_signed(payload) {
            Ok(alert) => alert,
            Err(err) => {
                debug!("Discarding malformed payload from peer {}: {}", source, err);
                return Err(err.into());
            }
        };
        debug!("Received alert {} from peer {}", alert.id(), source);

        match self.submit_and_disseminate(alert, Some(source)) {
            Ok(_) => Ok(()),
            Err(err) => {
                debug!("Dropped alert from peer {}: {}", source, err);
                Err(err)
            }
        }
    }

    fn handle_peer_connected(&self, peer: PeerId) -> usize {
        let now = self.clock.now();
        let alerts = self.store.read().all_active(now);

        let mut delivered = 0;
        for alert in &alerts {
            let payload = encode_signed(alert);
            if self.deliver(peer, alert, &payload) {
                delivered += 1;
            }
        }
        if delivered > 0 {
            info!(
                "Delivered {} alert(s) to newly connected peer {}",
                delivered, peer
            );
        }
        delivered
    }

    fn handle_peer_disconnected(&self, peer: PeerId) {
        self.sent.write().forget_peer(&peer);
        debug!("Cleared delivery records for departed peer {}", peer);
    }
}
