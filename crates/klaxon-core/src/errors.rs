//! Error types for alert decoding, signing, and store admission.

use thiserror::Error;

use crate::alert::{AlertId, Timestamp};

/// Errors raised while decoding an alert from wire bytes.
///
/// Every variant is a recoverable rejection of untrusted input; decoding
/// never panics on malformed bytes.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DecodeError {
    /// Input ended before a field was fully read.
    #[error("Unexpected end of input: wanted {wanted} bytes, {remaining} remaining")]
    UnexpectedEof {
        /// Bytes the current field still required.
        wanted: u64,
        /// Bytes left in the input.
        remaining: u64,
    },

    /// A compact-size length prefix was not minimally encoded.
    #[error("Length prefix {value} is not minimally encoded")]
    NonCanonicalLength {
        /// The decoded length value.
        value: u64,
    },

    /// A string field did not contain valid UTF-8.
    #[error("String field is not valid UTF-8")]
    InvalidUtf8,

    /// Bytes remained after the signature was fully read.
    #[error("{count} trailing bytes after signature")]
    TrailingBytes {
        /// Number of unconsumed bytes.
        count: usize,
    },
}

/// Errors raised while constructing a signing key or producing a signature.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum SigningError {
    /// Key material was not a valid secp256k1 secret scalar.
    #[error("Invalid private key")]
    InvalidPrivateKey,

    /// The curve backend refused to produce a signature.
    #[error("Signing failed")]
    SigningFailed,
}

/// Reasons the alert store refuses an alert.
///
/// Rejections of network-received alerts are logged and dropped; the same
/// rejection on an operator-submitted alert is surfaced to the caller.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum Rejection {
    /// The signature does not verify against any key in the ring.
    #[error("Alert signature does not verify against any known key")]
    InvalidSignature,

    /// The alert's expiration time has already passed.
    #[error("Alert {id} already expired at {expiration} (now {now})")]
    AlreadyExpired {
        /// Id of the rejected alert.
        id: AlertId,
        /// Expiration timestamp carried by the alert.
        expiration: Timestamp,
        /// Clock reading at submission.
        now: Timestamp,
    },

    /// An alert with this id already exists with different content.
    #[error("Alert id {0} already present with different content")]
    DuplicateId(AlertId),

    /// The id is covered by a cancellation, live or remembered.
    #[error("Alert {id} is cancelled by alert {by}")]
    Cancelled {
        /// Id of the rejected alert.
        id: AlertId,
        /// Id of the alert whose cancellation covers it.
        by: AlertId,
    },

    /// The reserved maximal id was used with non-canonical content.
    #[error("Alert {0} claims the reserved final id with non-canonical content")]
    InvalidFinalAlert(AlertId),
}
