//! # Integration Test Flows
//!
//! Multi-node dissemination tests: an alert injected at one node must reach
//! and converge on every other node, including cancellations and the final
//! alert. Nodes are wired back to back over the in-process channel
//! transport; a test pump shuttles queued payloads between them until
//! traffic stops.

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use tokio::sync::mpsc;

    use klaxon_core::alert::{AlertId, SignedAlert, UnsignedAlert, FINAL_ALERT_ID};
    use klaxon_core::codec::{decode_signed, encode_signed, encode_unsigned};
    use klaxon_core::errors::{DecodeError, Rejection};
    use klaxon_core::signing::{
        alert_digest, sign_alert, AlertSigningKey, KeyRing, NetworkEnvironment,
    };
    use klaxon_core::store::AlertStatus;
    use klaxon_relay::adapters::transport::ChannelTransport;
    use klaxon_relay::domain::{PeerId, RelayConfig, RelayError};
    use klaxon_relay::ports::inbound::{AlertReceiver, AlertRelayApi};
    use klaxon_relay::service::AlertRelayService;
    use klaxon_relay::test_utils::FixedTimeSource;

    const NOW: i64 = 1_700_000_000;

    type Node = AlertRelayService<ChannelTransport, FixedTimeSource>;

    // =========================================================================
    // TEST FIXTURES
    // =========================================================================

    fn create_node(key: &AlertSigningKey) -> (Arc<Node>, Arc<ChannelTransport>) {
        let ring = KeyRing::new(vec![key.public_key_bytes()]);
        let transport = Arc::new(ChannelTransport::new());
        let clock = Arc::new(FixedTimeSource::new(NOW));
        let node = Arc::new(AlertRelayService::new(
            RelayConfig::new(NetworkEnvironment::Test),
            ring,
            Arc::clone(&transport),
            clock,
        ));
        (node, transport)
    }

    fn signed(key: &AlertSigningKey, alert: UnsignedAlert) -> SignedAlert {
        sign_alert(&alert, key).unwrap()
    }

    fn live_alert(key: &AlertSigningKey, id: AlertId) -> SignedAlert {
        signed(key, UnsignedAlert::new(id).with_standard_windows(NOW))
    }

    /// Three relay nodes in a line: A ↔ B ↔ C. Alerts entering at A can only
    /// reach C through B's onward relay.
    struct ChainNet {
        node_a: Arc<Node>,
        node_b: Arc<Node>,
        node_c: Arc<Node>,
        peer_a: PeerId,
        peer_b: PeerId,
        peer_c: PeerId,
        a_to_b: mpsc::UnboundedReceiver<Vec<u8>>,
        b_to_a: mpsc::UnboundedReceiver<Vec<u8>>,
        b_to_c: mpsc::UnboundedReceiver<Vec<u8>>,
        c_to_b: mpsc::UnboundedReceiver<Vec<u8>>,
        key: AlertSigningKey,
    }

    fn create_chain() -> ChainNet {
        let key = AlertSigningKey::generate();
        let peer_a = PeerId::new([0xAA; 32]);
        let peer_b = PeerId::new([0xBB; 32]);
        let peer_c = PeerId::new([0xCC; 32]);

        let (node_a, transport_a) = create_node(&key);
        let (node_b, transport_b) = create_node(&key);
        let (node_c, transport_c) = create_node(&key);

        let a_to_b = transport_a.connect(peer_b);
        let b_to_a = transport_b.connect(peer_a);
        let b_to_c = transport_b.connect(peer_c);
        let c_to_b = transport_c.connect(peer_b);

        ChainNet {
            node_a,
            node_b,
            node_c,
            peer_a,
            peer_b,
            peer_c,
            a_to_b,
            b_to_a,
            b_to_c,
            c_to_b,
            key,
        }
    }

    impl ChainNet {
        /// Shuttles queued payloads between the nodes until traffic stops.
        fn pump(&mut self) {
            loop {
                let mut progressed = false;
                while let Ok(payload) = self.a_to_b.try_recv() {
                    let _ = self.node_b.handle_alert(self.peer_a, &payload);
                    progressed = true;
                }
                while let Ok(payload) = self.b_to_a.try_recv() {
                    let _ = self.node_a.handle_alert(self.peer_b, &payload);
                    progressed = true;
                }
                while let Ok(payload) = self.b_to_c.try_recv() {
                    let _ = self.node_c.handle_alert(self.peer_b, &payload);
                    progressed = true;
                }
                while let Ok(payload) = self.c_to_b.try_recv() {
                    let _ = self.node_b.handle_alert(self.peer_c, &payload);
                    progressed = true;
                }
                if !progressed {
                    break;
                }
            }
        }

        fn statuses(&self, id: AlertId) -> [AlertStatus; 3] {
            [
                self.node_a.alert_status(id),
                self.node_b.alert_status(id),
                self.node_c.alert_status(id),
            ]
        }
    }

    // =========================================================================
    // MULTI-NODE CONVERGENCE
    // =========================================================================

    #[test]
    fn test_alert_propagates_through_chain() {
        let mut net = create_chain();
        let alert = signed(
            &net.key,
            UnsignedAlert::new(1040)
                .with_priority(100)
                .with_status_text("test")
                .with_standard_windows(NOW),
        );

        let report = net.node_a.broadcast_alert(alert.clone()).unwrap();
        assert_eq!(report.peers_reached, 1);
        net.pump();

        // C only borders B, so the alert arrived through B's onward relay.
        assert_eq!(net.statuses(1040), [AlertStatus::Active; 3]);
        let at_c = net.node_c.active_alerts(70001, "");
        assert_eq!(at_c.len(), 1);
        assert_eq!(at_c[0].hash(), alert.hash());
        assert_eq!(at_c[0].unsigned.status_text, "test");
    }

    #[test]
    fn test_cancellation_converges_everywhere() {
        let mut net = create_chain();
        let original = live_alert(&net.key, 5);
        let original_payload = encode_signed(&original);

        net.node_a.broadcast_alert(original).unwrap();
        net.pump();
        assert_eq!(net.statuses(5), [AlertStatus::Active; 3]);

        let canceller = signed(
            &net.key,
            UnsignedAlert::new(6).with_cancel(5).with_standard_windows(NOW),
        );
        net.node_a.broadcast_alert(canceller).unwrap();
        net.pump();

        assert_eq!(net.statuses(5), [AlertStatus::Cancelled; 3]);
        assert_eq!(net.statuses(6), [AlertStatus::Active; 3]);

        // Replaying the dead alert at the far end names its canceller.
        let replay = net.node_c.handle_alert(net.peer_b, &original_payload);
        assert!(matches!(
            replay,
            Err(RelayError::Rejected(Rejection::Cancelled { id: 5, by: 6 }))
        ));
    }

    #[test]
    fn test_nodes_agree_regardless_of_arrival_order() {
        let key = AlertSigningKey::generate();
        let (first_node, _t1) = create_node(&key);
        let (second_node, _t2) = create_node(&key);
        let source = PeerId::new([1u8; 32]);

        let alert_payload = encode_signed(&live_alert(&key, 5));
        let cancel_payload = encode_signed(&signed(
            &key,
            UnsignedAlert::new(6).with_cancel(5).with_standard_windows(NOW),
        ));

        // One node sees the alert before its cancellation, the other after.
        first_node.handle_alert(source, &alert_payload).unwrap();
        first_node.handle_alert(source, &cancel_payload).unwrap();
        second_node.handle_alert(source, &cancel_payload).unwrap();
        let late = second_node.handle_alert(source, &alert_payload);
        assert!(matches!(late, Err(RelayError::Rejected(_))));

        // Both converge on the same visible set.
        for node in [&first_node, &second_node] {
            let ids: Vec<AlertId> = node
                .active_alerts(70001, "")
                .iter()
                .map(|a| a.id())
                .collect();
            assert_eq!(ids, vec![6]);
            assert_ne!(node.alert_status(5), AlertStatus::Active);
        }
    }

    #[test]
    fn test_final_alert_locks_the_whole_network() {
        let mut net = create_chain();
        net.node_a.broadcast_alert(live_alert(&net.key, 5)).unwrap();
        net.pump();

        let final_alert = signed(&net.key, UnsignedAlert::final_alert());
        net.node_a.broadcast_alert(final_alert).unwrap();
        net.pump();

        assert_eq!(net.statuses(FINAL_ALERT_ID), [AlertStatus::Active; 3]);
        assert_eq!(net.statuses(5), [AlertStatus::Cancelled; 3]);

        // No node accepts anything signed afterward.
        let late = net.node_b.broadcast_alert(live_alert(&net.key, 9));
        assert!(matches!(
            late,
            Err(RelayError::Rejected(Rejection::Cancelled {
                id: 9,
                by: FINAL_ALERT_ID
            }))
        ));
    }

    #[test]
    fn test_concurrent_receipt_stores_once() {
        let key = AlertSigningKey::generate();
        let (node, _transport) = create_node(&key);
        let payload = encode_signed(&live_alert(&key, 5));

        let mut handles = Vec::new();
        for i in 0..8u8 {
            let node = Arc::clone(&node);
            let payload = payload.clone();
            handles.push(std::thread::spawn(move || {
                node.handle_alert(PeerId::new([i; 32]), &payload)
            }));
        }
        for handle in handles {
            assert!(handle.join().unwrap().is_ok());
        }

        assert_eq!(node.relay_metrics().alerts_accepted, 1);
        assert_eq!(node.alert_status(5), AlertStatus::Active);
    }

    // =========================================================================
    // WIRE COMPATIBILITY
    // =========================================================================

    #[test]
    fn test_wire_layout_is_stable() {
        let alert = UnsignedAlert::new(1040)
            .with_priority(100)
            .with_status_text("test")
            .with_standard_windows(NOW);
        let encoded = encode_unsigned(&alert);

        // Format version 1 leads the record, little-endian.
        assert_eq!(hex::encode(&encoded[..4]), "01000000");
        // The id sits after the two 8-byte timestamps: 1040 = 0x0410.
        assert_eq!(hex::encode(&encoded[20..24]), "10040000");
    }

    #[test]
    fn test_handwritten_k256_signature_interops() {
        use k256::ecdsa::signature::hazmat::PrehashSigner;
        use k256::ecdsa::{Signature, SigningKey};

        // Sign with raw k256 calls rather than the crate's signer.
        let signing_key = SigningKey::random(&mut rand::thread_rng());
        let unsigned = UnsignedAlert::new(77)
            .with_status_text("interop")
            .with_standard_windows(NOW);
        let encoded_unsigned = encode_unsigned(&unsigned);
        let digest = alert_digest(&encoded_unsigned);
        let signature: Signature = signing_key.sign_prehash(&digest).unwrap();

        let alert = SignedAlert {
            unsigned,
            signature: signature.to_bytes().to_vec(),
            encoded_unsigned,
        };

        let ring = KeyRing::new(vec![signing_key.verifying_key().to_sec1_bytes().to_vec()]);
        assert!(ring.verify(&alert.encoded_unsigned, &alert.signature));

        // The relay stack accepts it end to end.
        let transport = Arc::new(ChannelTransport::new());
        let clock = Arc::new(FixedTimeSource::new(NOW));
        let node = AlertRelayService::new(
            RelayConfig::new(NetworkEnvironment::Test),
            ring,
            transport,
            clock,
        );
        node.broadcast_alert(alert).unwrap();
        assert_eq!(node.alert_status(77), AlertStatus::Active);
    }

    // =========================================================================
    // DECODER ROBUSTNESS
    // =========================================================================

    #[test]
    fn test_decoder_survives_random_garbage() {
        use rand::{Rng, SeedableRng};

        let mut rng = rand::rngs::StdRng::seed_from_u64(0x4b4c_584e);
        for _ in 0..512 {
            let len = rng.gen_range(0..160);
            let mut bytes = vec![0u8; len];
            rng.fill(&mut bytes[..]);
            // Must never panic or overallocate, whatever the bytes say.
            let _ = decode_signed(&bytes);
        }
    }

    #[test]
    fn test_decoder_rejects_giant_length_claim() {
        // A valid unsigned portion followed by a signature length of
        // u64::MAX. The decoder must bail on the length check instead of
        // trying to allocate.
        let mut evil = encode_unsigned(&UnsignedAlert::new(1));
        evil.push(0xFF);
        evil.extend_from_slice(&u64::MAX.to_le_bytes());

        let result = decode_signed(&evil);
        assert!(matches!(result, Err(DecodeError::UnexpectedEof { .. })));
    }
}
