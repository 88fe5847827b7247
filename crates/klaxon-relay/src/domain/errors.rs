//! Relay error types.

use klaxon_core::errors::{DecodeError, Rejection};
use thiserror::Error;

use super::value_objects::PeerId;

/// Alert relay errors.
#[derive(Debug, Error)]
pub enum RelayError {
    /// An alert we were about to broadcast failed the same checks a
    /// receiving node would apply. Broadcasting it would spam the network
    /// with traffic every peer rejects.
    #[error("Alert failed self-verification before broadcast: {0}")]
    SelfVerificationFailed(String),

    /// The alert store refused the alert.
    #[error("Alert rejected: {0}")]
    Rejected(#[from] Rejection),

    /// A network payload did not decode as an alert.
    #[error("Malformed alert payload: {0}")]
    Malformed(#[from] DecodeError),

    /// The transport could not deliver to a peer.
    #[error("Peer unreachable: {0}")]
    PeerUnreachable(PeerId),
}
