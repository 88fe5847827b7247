//! # Alert Lifecycle Tests
//!
//! Time-driven behavior on a single node: relay windows closing, expiry
//! sweeps, supersession chains, and replays, all on a manually advanced
//! clock.

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use klaxon_core::alert::{SignedAlert, UnsignedAlert};
    use klaxon_core::codec::encode_signed;
    use klaxon_core::errors::Rejection;
    use klaxon_core::signing::{sign_alert, AlertSigningKey, KeyRing, NetworkEnvironment};
    use klaxon_core::store::AlertStatus;
    use klaxon_relay::adapters::transport::ChannelTransport;
    use klaxon_relay::domain::{PeerId, RelayConfig, RelayError};
    use klaxon_relay::ports::inbound::{AlertReceiver, AlertRelayApi};
    use klaxon_relay::service::AlertRelayService;
    use klaxon_relay::test_utils::FixedTimeSource;

    const NOW: i64 = 1_700_000_000;

    // =========================================================================
    // TEST FIXTURES
    // =========================================================================

    struct Harness {
        node: Arc<AlertRelayService<ChannelTransport, FixedTimeSource>>,
        transport: Arc<ChannelTransport>,
        clock: Arc<FixedTimeSource>,
        key: AlertSigningKey,
    }

    fn create_harness() -> Harness {
        let key = AlertSigningKey::generate();
        let ring = KeyRing::new(vec![key.public_key_bytes()]);
        let transport = Arc::new(ChannelTransport::new());
        let clock = Arc::new(FixedTimeSource::new(NOW));
        let node = Arc::new(AlertRelayService::new(
            RelayConfig::new(NetworkEnvironment::Test),
            ring,
            Arc::clone(&transport),
            Arc::clone(&clock),
        ));
        Harness {
            node,
            transport,
            clock,
            key,
        }
    }

    fn signed(key: &AlertSigningKey, alert: UnsignedAlert) -> SignedAlert {
        sign_alert(&alert, key).unwrap()
    }

    // =========================================================================
    // WINDOW TRANSITIONS
    // =========================================================================

    #[test]
    fn test_window_lifecycle_on_one_node() {
        let h = create_harness();

        // A peer online before the broadcast is flooded immediately.
        let early = PeerId::new([1u8; 32]);
        let mut early_rx = h.transport.connect(early);
        let report = h
            .node
            .broadcast_alert(signed(
                &h.key,
                UnsignedAlert::new(5)
                    .with_status_text("upgrade required")
                    .with_standard_windows(NOW),
            ))
            .unwrap();
        assert_eq!(report.peers_reached, 1);
        assert!(early_rx.try_recv().is_ok());

        // The 15-minute flood window closes.
        h.clock.advance(901);

        // A peer connecting late still receives the alert at connect time.
        let late = PeerId::new([2u8; 32]);
        let mut late_rx = h.transport.connect(late);
        assert_eq!(h.node.handle_peer_connected(late), 1);
        assert!(late_rx.try_recv().is_ok());

        // But periodic passes no longer push it to anyone.
        let idle = PeerId::new([3u8; 32]);
        let mut idle_rx = h.transport.connect(idle);
        assert_eq!(h.node.sweep_and_flood(), 0);
        assert!(idle_rx.try_recv().is_err());

        // Death time passes; the alert is gone for everyone.
        h.clock.advance(1_314_000);
        assert_eq!(h.node.sweep_and_flood(), 0);
        assert_eq!(h.node.alert_status(5), AlertStatus::Expired);
        assert_eq!(h.node.handle_peer_connected(idle), 0);
        assert!(h.node.active_alerts(70001, "").is_empty());
    }

    #[test]
    fn test_expired_replay_is_rejected() {
        let h = create_harness();
        let alert = signed(
            &h.key,
            UnsignedAlert::new(5)
                .with_relay_until(NOW + 900)
                .with_expiration(NOW + 1_000),
        );
        let payload = encode_signed(&alert);
        h.node.broadcast_alert(alert).unwrap();

        h.clock.advance(2_000);
        h.node.sweep_and_flood();
        assert_eq!(h.node.alert_status(5), AlertStatus::Expired);

        // The saved payload is now a corpse; nobody re-admits it.
        let replay = h.node.handle_alert(PeerId::new([9u8; 32]), &payload);
        assert!(matches!(
            replay,
            Err(RelayError::Rejected(Rejection::AlreadyExpired { .. }))
        ));
    }

    // =========================================================================
    // SUPERSESSION OVER TIME
    // =========================================================================

    #[test]
    fn test_supersession_chain_over_time() {
        let h = create_harness();
        let peer = PeerId::new([1u8; 32]);
        let mut rx = h.transport.connect(peer);

        h.node
            .broadcast_alert(signed(
                &h.key,
                UnsignedAlert::new(7)
                    .with_status_text("v1")
                    .with_standard_windows(NOW),
            ))
            .unwrap();

        for (elapsed, text) in [(100, "v2"), (200, "v3")] {
            h.clock.set(NOW + elapsed);
            h.node
                .broadcast_alert(signed(
                    &h.key,
                    UnsignedAlert::new(7)
                        .with_cancel(7)
                        .with_status_text(text)
                        .with_standard_windows(NOW + elapsed),
                ))
                .unwrap();
        }

        // The lineage stayed live through every replacement.
        assert_eq!(h.node.alert_status(7), AlertStatus::Active);
        let visible = h.node.active_alerts(70001, "");
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].unsigned.status_text, "v3");

        // Each revision went out to the connected peer.
        let mut received = 0;
        while rx.try_recv().is_ok() {
            received += 1;
        }
        assert_eq!(received, 3);
        assert_eq!(h.node.relay_metrics().alerts_accepted, 3);
    }

    // =========================================================================
    // TARGETING
    // =========================================================================

    #[test]
    fn test_version_targeting_visibility() {
        let h = create_harness();
        h.node
            .broadcast_alert(signed(
                &h.key,
                UnsignedAlert::new(5)
                    .with_version_range(70_000, 70_010)
                    .with_standard_windows(NOW),
            ))
            .unwrap();

        // The default node identity (70001) falls inside the range.
        assert_eq!(h.node.applicable_alerts().len(), 1);
        assert_eq!(h.node.active_alerts(70_010, "").len(), 1);
        assert!(h.node.active_alerts(60_002, "").is_empty());
        assert!(h.node.active_alerts(70_020, "").is_empty());

        // Out-of-range nodes still hold and relay the alert.
        assert_eq!(h.node.alert_status(5), AlertStatus::Active);
    }

    #[test]
    fn test_sub_version_targeting_visibility() {
        let h = create_harness();
        h.node
            .broadcast_alert(signed(
                &h.key,
                UnsignedAlert::new(5)
                    .with_sub_versions(["/klaxon:0.8.0/"])
                    .with_standard_windows(NOW),
            ))
            .unwrap();

        assert_eq!(h.node.active_alerts(70_001, "/klaxon:0.8.0/").len(), 1);
        assert!(h.node.active_alerts(70_001, "/klaxon:0.9.0/").is_empty());
        assert!(h.node.active_alerts(70_001, "").is_empty());
    }

    // =========================================================================
    // ID MONOTONY
    // =========================================================================

    #[test]
    fn test_expired_lineage_cannot_be_reused() {
        let h = create_harness();
        h.node
            .broadcast_alert(signed(
                &h.key,
                UnsignedAlert::new(5)
                    .with_relay_until(NOW + 900)
                    .with_expiration(NOW + 1_000),
            ))
            .unwrap();

        h.clock.advance(5_000);
        h.node.sweep_and_flood();
        assert_eq!(h.node.alert_status(5), AlertStatus::Expired);

        // Fresh content under the dead id is refused; ids burn out for good.
        let reuse = signed(
            &h.key,
            UnsignedAlert::new(5)
                .with_status_text("second life")
                .with_standard_windows(NOW + 5_000),
        );
        let result = h.node.broadcast_alert(reuse);
        assert!(matches!(
            result,
            Err(RelayError::Rejected(Rejection::DuplicateId(5)))
        ));
    }
}
