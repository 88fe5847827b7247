//! # Klaxon Core
//!
//! Data model, wire codec, signing, and storage for the Klaxon network
//! alert protocol: signed operator broadcasts that reach every node of a
//! peer-to-peer network within minutes.
//!
//! ## Modules
//!
//! - [`alert`]: alert records, time windows, targeting and cancellation rules
//! - [`codec`]: canonical binary encoding and strict decoding
//! - [`signing`]: double-SHA-256 digests, ECDSA signing, key allowlists
//! - [`store`]: lifecycle table with supersession, cancellation, and expiry
//! - [`errors`]: decode, signing, and rejection error types
//!
//! ## Trust model
//!
//! Authority lives in a small allowlist of ECDSA public keys
//! ([`signing::KeyRing`]). A signature that verifies against any ring key
//! makes an alert authentic; nothing else does. Verification happens over
//! the exact received bytes, never over a re-encoding.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod alert;
pub mod codec;
pub mod errors;
pub mod signing;
pub mod store;

pub use alert::{
    AlertId, RelayDecision, SignedAlert, Timestamp, UnsignedAlert, FINAL_ALERT_ID,
};
pub use codec::{decode_signed, encode_signed, encode_unsigned};
pub use errors::{DecodeError, Rejection, SigningError};
pub use signing::{sign_alert, AlertSigningKey, KeyRing, NetworkEnvironment};
pub use store::{Accepted, AlertStatus, AlertStore};

/// Crate version, sourced from Cargo.toml.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
