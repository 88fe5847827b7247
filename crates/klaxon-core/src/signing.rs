//! # Alert Signing (secp256k1)
//!
//! ECDSA signing and verification for alerts.
//!
//! ## Security Properties
//!
//! - RFC 6979 deterministic nonces (no RNG dependency for signing)
//! - Signatures cover the double-SHA-256 of the encoded unsigned portion
//! - Verification is allowlist-based: a small fixed ring of master public
//!   keys per network environment, no PKI
//!
//! Alerts are a low-frequency, high-trust emergency channel; simplicity and
//! auditability dominate the key-management design. Malformed signatures or
//! ring keys never panic, they simply fail verification.

use k256::ecdsa::signature::hazmat::{PrehashSigner, PrehashVerifier};
use k256::ecdsa::{Signature, SigningKey, VerifyingKey};
use sha2::{Digest, Sha256};
use zeroize::Zeroize;

use crate::alert::{SignedAlert, UnsignedAlert};
use crate::codec::encode_unsigned;
use crate::errors::SigningError;

/// Length of an alert signature in bytes (fixed-width `r || s`).
pub const SIGNATURE_SIZE: usize = 64;

/// Built-in master alert key for the main network (SEC1 uncompressed).
#[rustfmt::skip]
pub const MAIN_ALERT_KEY: [u8; 65] = [
    0x04, 0xfc, 0x97, 0x02, 0x84, 0x78, 0x40, 0xaa, 0xf1, 0x95, 0xde, 0x84, 0x42,
    0xeb, 0xec, 0xed, 0xf5, 0xb0, 0x95, 0xcd, 0xbb, 0x9b, 0xc7, 0x16, 0xbd, 0xa9,
    0x11, 0x09, 0x71, 0xb2, 0x8a, 0x49, 0xe0, 0xea, 0xd8, 0x56, 0x4f, 0xf0, 0xdb,
    0x22, 0x20, 0x9e, 0x03, 0x74, 0x78, 0x2c, 0x09, 0x3b, 0xb8, 0x99, 0x69, 0x2d,
    0x52, 0x4e, 0x9d, 0x6a, 0x69, 0x56, 0xe7, 0xc5, 0xec, 0xbc, 0xd6, 0x82, 0x84,
];

/// Built-in master alert key for the test network (SEC1 uncompressed).
#[rustfmt::skip]
pub const TEST_ALERT_KEY: [u8; 65] = [
    0x04, 0x30, 0x23, 0x90, 0x34, 0x3f, 0x91, 0xcc, 0x40, 0x1d, 0x56, 0xd6, 0x8b,
    0x12, 0x30, 0x28, 0xbf, 0x52, 0xe5, 0xfc, 0xa1, 0x93, 0x9d, 0xf1, 0x27, 0xf6,
    0x3c, 0x64, 0x67, 0xcd, 0xf9, 0xc8, 0xe2, 0xc1, 0x4b, 0x61, 0x10, 0x4c, 0xf8,
    0x17, 0xd0, 0xb7, 0x80, 0xda, 0x33, 0x78, 0x93, 0xec, 0xc4, 0xaa, 0xff, 0x13,
    0x09, 0xe5, 0x36, 0x16, 0x2d, 0xab, 0xbd, 0xb4, 0x52, 0x00, 0xca, 0x2b, 0x0a,
];

/// Which deployment's master keys to trust.
///
/// Always an explicit parameter, never ambient state: the environment is
/// threaded into [`KeyRing::for_environment`] and the relay service by the
/// embedding process.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NetworkEnvironment {
    /// The production network.
    Main,
    /// The public test network.
    Test,
}

impl std::fmt::Display for NetworkEnvironment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NetworkEnvironment::Main => write!(f, "main"),
            NetworkEnvironment::Test => write!(f, "test"),
        }
    }
}

/// Double-SHA-256 of the encoded unsigned portion.
///
/// This is the digest alert signatures cover, and the alert's identity in
/// logs and content comparisons.
pub fn alert_digest(encoded_unsigned: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(encoded_unsigned);
    let first = hasher.finalize();

    let mut hasher = Sha256::new();
    hasher.update(first);
    hasher.finalize().into()
}

/// Master private key used to author alerts.
///
/// Secret material is zeroized on drop.
pub struct AlertSigningKey {
    signing_key: SigningKey,
}

impl AlertSigningKey {
    /// Generate a random key (test environments and fixtures).
    pub fn generate() -> Self {
        Self {
            signing_key: SigningKey::random(&mut rand::thread_rng()),
        }
    }

    /// Create from raw secret scalar bytes (32 bytes).
    pub fn from_bytes(bytes: [u8; 32]) -> Result<Self, SigningError> {
        let signing_key = SigningKey::from_bytes((&bytes).into())
            .map_err(|_| SigningError::InvalidPrivateKey)?;
        Ok(Self { signing_key })
    }

    /// Create from an operator-supplied hex string (64 hex digits).
    pub fn from_hex(hex_key: &str) -> Result<Self, SigningError> {
        let mut decoded =
            hex::decode(hex_key.trim()).map_err(|_| SigningError::InvalidPrivateKey)?;
        if decoded.len() != 32 {
            decoded.zeroize();
            return Err(SigningError::InvalidPrivateKey);
        }
        let mut bytes = [0u8; 32];
        bytes.copy_from_slice(&decoded);
        decoded.zeroize();
        let key = Self::from_bytes(bytes);
        bytes.zeroize();
        key
    }

    /// Public key in SEC1 compressed form (33 bytes), for building rings.
    pub fn public_key_bytes(&self) -> Vec<u8> {
        self.signing_key.verifying_key().to_sec1_bytes().to_vec()
    }

    /// Sign a 32-byte digest (deterministic RFC 6979).
    pub fn sign_digest(&self, digest: &[u8; 32]) -> Result<[u8; SIGNATURE_SIZE], SigningError> {
        let signature: Signature = self
            .signing_key
            .sign_prehash(digest)
            .map_err(|_| SigningError::SigningFailed)?;
        Ok(signature.to_bytes().into())
    }

    /// Get secret key bytes (for operator storage).
    pub fn to_bytes(&self) -> [u8; 32] {
        self.signing_key.to_bytes().into()
    }
}

impl Drop for AlertSigningKey {
    fn drop(&mut self) {
        let mut bytes: [u8; 32] = self.signing_key.to_bytes().into();
        bytes.zeroize();
    }
}

/// Signs an alert, producing the signed record with its exact covered bytes.
///
/// The unsigned portion is encoded once and retained verbatim; any later
/// field change requires re-signing.
pub fn sign_alert(
    unsigned: &UnsignedAlert,
    key: &AlertSigningKey,
) -> Result<SignedAlert, SigningError> {
    let encoded_unsigned = encode_unsigned(unsigned);
    let digest = alert_digest(&encoded_unsigned);
    let signature = key.sign_digest(&digest)?;
    Ok(SignedAlert {
        unsigned: unsigned.clone(),
        signature: signature.to_vec(),
        encoded_unsigned,
    })
}

/// Fixed allowlist of master public keys for one network environment.
///
/// Keys are held as SEC1 bytes (compressed or uncompressed) and parsed per
/// verification, so a corrupt entry degrades to "does not verify" instead
/// of failing construction. For key rotation, build a ring that retains the
/// old keys alongside the new so previously issued alerts keep verifying.
#[derive(Clone, Debug)]
pub struct KeyRing {
    keys: Vec<Vec<u8>>,
}

impl KeyRing {
    /// Build a ring from SEC1-encoded public keys.
    pub fn new(keys: Vec<Vec<u8>>) -> Self {
        Self { keys }
    }

    /// The built-in ring for a network environment.
    pub fn for_environment(environment: NetworkEnvironment) -> Self {
        match environment {
            NetworkEnvironment::Main => Self::new(vec![MAIN_ALERT_KEY.to_vec()]),
            NetworkEnvironment::Test => Self::new(vec![TEST_ALERT_KEY.to_vec()]),
        }
    }

    /// Verify a signature over the encoded unsigned portion of an alert.
    ///
    /// Returns true iff the signature validates for any ring key. Malformed
    /// signature bytes or ring keys never panic; they fail verification.
    pub fn verify(&self, encoded_unsigned: &[u8], signature: &[u8]) -> bool {
        let signature = match Signature::from_slice(signature) {
            Ok(signature) => signature,
            Err(_) => return false,
        };
        let digest = alert_digest(encoded_unsigned);

        self.keys.iter().any(|key| {
            VerifyingKey::from_sec1_bytes(key)
                .map(|verifying_key| verifying_key.verify_prehash(&digest, &signature).is_ok())
                .unwrap_or(false)
        })
    }

    /// Number of keys in the ring.
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Whether the ring holds no keys (verifies nothing).
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}
