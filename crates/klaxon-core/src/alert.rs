//! # Alert Records
//!
//! Defines the alert data model shared by every component.
//!
//! ## Entities
//!
//! - [`UnsignedAlert`]: the operator-authored payload covered by the signature
//! - [`SignedAlert`]: an unsigned alert plus its signature and the exact
//!   bytes that were signed
//! - [`RelayDecision`]: what the dissemination layer should do with an alert
//!   at a given instant
//!
//! An alert is immutable once signed: any field change invalidates the
//! signature and requires re-signing.

use std::collections::BTreeSet;
use std::fmt;

use crate::signing::alert_digest;

/// Operator-assigned alert identifier, unique per alert lineage.
pub type AlertId = u32;

/// Unix timestamp in seconds.
pub type Timestamp = i64;

/// Wire-format version written into every alert this crate constructs.
pub const ALERT_FORMAT_VERSION: u32 = 1;

/// Default flood window applied by [`UnsignedAlert::with_standard_windows`]:
/// 15 minutes of proactive relay.
pub const DEFAULT_RELAY_WINDOW_SECS: i64 = 15 * 60;

/// Default lifetime applied by [`UnsignedAlert::with_standard_windows`]:
/// 365 hours until expiration.
pub const DEFAULT_LIFETIME_SECS: i64 = 365 * 60 * 60;

/// Reserved id for the key-compromise lockout alert.
///
/// An alert carrying this id is only accepted in the canonical form built by
/// [`UnsignedAlert::final_alert`]; see [`UnsignedAlert::is_valid_final_alert`].
pub const FINAL_ALERT_ID: AlertId = u32::MAX;

/// Canonical status text of the key-compromise lockout alert.
pub const FINAL_ALERT_STATUS: &str = "URGENT: Alert key compromised, upgrade required";

/// What the dissemination layer should do with an alert right now.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RelayDecision {
    /// Inside the relay window: push to every connected peer.
    Flood,
    /// Past the relay window but not expired: offer at connect time only.
    Announce,
    /// Expired: never send.
    Suppress,
}

/// The signed payload of an alert.
///
/// Field order matches the wire encoding (see the codec module). The two set
/// fields use [`BTreeSet`] so iteration order, and therefore the encoding,
/// is canonical.
///
/// # Example
///
/// ```rust
/// use klaxon_core::alert::UnsignedAlert;
///
/// let alert = UnsignedAlert::new(1040)
///     .with_priority(100)
///     .with_status_text("test")
///     .with_standard_windows(1_700_000_000);
///
/// assert_eq!(alert.relay_until, 1_700_000_000 + 900);
/// assert!(alert.applies_to(70005, "/peer:0.8.1/"));
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnsignedAlert {
    /// Wire-format version of the alert message itself.
    pub version: u32,
    /// Flood deadline: proactive relay stops once this passes.
    pub relay_until: Timestamp,
    /// Death time: the alert must not be relayed, stored, or displayed after.
    pub expiration: Timestamp,
    /// Operator-assigned id, the supersession key.
    pub id: AlertId,
    /// If nonzero, cancels every known alert with id at or below this value.
    pub cancel: AlertId,
    /// Specific ids to cancel, independent of the threshold.
    pub cancel_set: BTreeSet<AlertId>,
    /// Lowest protocol version this alert applies to.
    pub min_version: u32,
    /// Highest protocol version this alert applies to.
    pub max_version: u32,
    /// Client-identifying strings to match; empty means no filtering.
    pub sub_version_set: BTreeSet<String>,
    /// Higher values supersede lower-priority overlapping alerts (advisory).
    pub priority: u32,
    /// Operator-facing free text, not interpreted by the protocol.
    pub comment: String,
    /// Text surfaced in the node's status display.
    pub status_text: String,
    /// Spare free-text field, not interpreted by the protocol.
    pub reserved_text: String,
}

impl UnsignedAlert {
    /// Creates an empty alert with the given id and the current format
    /// version. Everything else starts zeroed: applies to all versions,
    /// cancels nothing, already past its (zero) time windows.
    pub fn new(id: AlertId) -> Self {
        Self {
            version: ALERT_FORMAT_VERSION,
            relay_until: 0,
            expiration: 0,
            id,
            cancel: 0,
            cancel_set: BTreeSet::new(),
            min_version: 0,
            max_version: 0,
            sub_version_set: BTreeSet::new(),
            priority: 0,
            comment: String::new(),
            status_text: String::new(),
            reserved_text: String::new(),
        }
    }

    /// Builds the canonical key-compromise lockout alert.
    ///
    /// It cancels every other alert, applies to all versions, floods forever,
    /// and never expires. Broadcast it when the master key leaks: nothing can
    /// cancel it afterward, locking the alert channel.
    pub fn final_alert() -> Self {
        Self {
            version: ALERT_FORMAT_VERSION,
            relay_until: Timestamp::MAX,
            expiration: Timestamp::MAX,
            id: FINAL_ALERT_ID,
            cancel: FINAL_ALERT_ID - 1,
            cancel_set: BTreeSet::new(),
            min_version: 0,
            max_version: u32::MAX,
            sub_version_set: BTreeSet::new(),
            priority: u32::MAX,
            comment: String::new(),
            status_text: FINAL_ALERT_STATUS.to_string(),
            reserved_text: String::new(),
        }
    }

    /// Builder method: set the cancel threshold.
    pub fn with_cancel(mut self, cancel: AlertId) -> Self {
        self.cancel = cancel;
        self
    }

    /// Builder method: set the specific ids to cancel.
    pub fn with_cancel_set(mut self, ids: impl IntoIterator<Item = AlertId>) -> Self {
        self.cancel_set = ids.into_iter().collect();
        self
    }

    /// Builder method: set the inclusive protocol version range.
    pub fn with_version_range(mut self, min_version: u32, max_version: u32) -> Self {
        self.min_version = min_version;
        self.max_version = max_version;
        self
    }

    /// Builder method: set the client sub-version strings to match.
    pub fn with_sub_versions<I, S>(mut self, sub_versions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.sub_version_set = sub_versions.into_iter().map(Into::into).collect();
        self
    }

    /// Builder method: set the priority.
    pub fn with_priority(mut self, priority: u32) -> Self {
        self.priority = priority;
        self
    }

    /// Builder method: set the operator comment.
    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = comment.into();
        self
    }

    /// Builder method: set the status display text.
    pub fn with_status_text(mut self, status_text: impl Into<String>) -> Self {
        self.status_text = status_text.into();
        self
    }

    /// Builder method: set the reserved text field.
    pub fn with_reserved_text(mut self, reserved_text: impl Into<String>) -> Self {
        self.reserved_text = reserved_text.into();
        self
    }

    /// Builder method: set the flood deadline.
    pub fn with_relay_until(mut self, relay_until: Timestamp) -> Self {
        self.relay_until = relay_until;
        self
    }

    /// Builder method: set the expiration time.
    pub fn with_expiration(mut self, expiration: Timestamp) -> Self {
        self.expiration = expiration;
        self
    }

    /// Builder method: stamp the standard operator windows relative to `now`
    /// (15-minute relay window, 365-hour lifetime).
    pub fn with_standard_windows(mut self, now: Timestamp) -> Self {
        self.relay_until = now.saturating_add(DEFAULT_RELAY_WINDOW_SECS);
        self.expiration = now.saturating_add(DEFAULT_LIFETIME_SECS);
        self
    }

    /// Whether this alert targets the given protocol version and client
    /// sub-version.
    ///
    /// An all-zero version range applies to every version; an empty
    /// sub-version set applies to every client.
    pub fn applies_to(&self, version: u32, sub_version: &str) -> bool {
        let version_matches = (self.min_version == 0 && self.max_version == 0)
            || (self.min_version <= version && version <= self.max_version);
        let sub_version_matches =
            self.sub_version_set.is_empty() || self.sub_version_set.contains(sub_version);
        version_matches && sub_version_matches
    }

    /// Whether the alert is past its expiration time.
    pub fn is_expired(&self, now: Timestamp) -> bool {
        now > self.expiration
    }

    /// Whether the alert is still live at `now`.
    pub fn is_in_effect(&self, now: Timestamp) -> bool {
        !self.is_expired(now)
    }

    /// Whether this alert cancels the alert with `other_id`, either through
    /// the threshold or the explicit cancel set.
    pub fn cancels(&self, other_id: AlertId) -> bool {
        self.cancel_set.contains(&other_id) || (self.cancel > 0 && other_id <= self.cancel)
    }

    /// Dissemination decision for this alert at `now`.
    ///
    /// Expiration dominates: an alert whose windows are inverted
    /// (`relay_until > expiration`) is suppressed once expired, never flooded.
    pub fn relay_decision(&self, now: Timestamp) -> RelayDecision {
        if self.is_expired(now) {
            RelayDecision::Suppress
        } else if now <= self.relay_until {
            RelayDecision::Flood
        } else {
            RelayDecision::Announce
        }
    }

    /// Whether this alert is the canonical key-compromise lockout alert.
    ///
    /// Any alert carrying [`FINAL_ALERT_ID`] in any other shape is forged or
    /// corrupt and must be rejected.
    pub fn is_valid_final_alert(&self) -> bool {
        self.id == FINAL_ALERT_ID
            && self.expiration == Timestamp::MAX
            && self.cancel == FINAL_ALERT_ID - 1
            && self.min_version == 0
            && self.max_version == u32::MAX
            && self.sub_version_set.is_empty()
            && self.priority == u32::MAX
            && self.status_text == FINAL_ALERT_STATUS
    }
}

impl fmt::Display for UnsignedAlert {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Alert {}:", self.id)?;
        writeln!(f, "    version       = {}", self.version)?;
        writeln!(f, "    relay_until   = {}", self.relay_until)?;
        writeln!(f, "    expiration    = {}", self.expiration)?;
        writeln!(f, "    cancel        = {}", self.cancel)?;
        writeln!(f, "    cancel_set    = {:?}", self.cancel_set)?;
        writeln!(
            f,
            "    version_range = [{}, {}]",
            self.min_version, self.max_version
        )?;
        writeln!(f, "    sub_versions  = {:?}", self.sub_version_set)?;
        writeln!(f, "    priority      = {}", self.priority)?;
        writeln!(f, "    comment       = {:?}", self.comment)?;
        writeln!(f, "    status_text   = {:?}", self.status_text)?;
        write!(f, "    reserved_text = {:?}", self.reserved_text)
    }
}

/// An alert plus its signature and the exact bytes the signature covers.
///
/// `encoded_unsigned` is retained verbatim from signing or decoding rather
/// than re-derived from the fields: the signature is only valid over the
/// bytes actually signed, and re-encoding after any mutation would silently
/// change what it covers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SignedAlert {
    /// The decoded payload fields.
    pub unsigned: UnsignedAlert,
    /// ECDSA signature over the double-SHA-256 of `encoded_unsigned`.
    pub signature: Vec<u8>,
    /// The exact unsigned-portion bytes covered by the signature.
    pub encoded_unsigned: Vec<u8>,
}

impl SignedAlert {
    /// The alert's id.
    pub fn id(&self) -> AlertId {
        self.unsigned.id
    }

    /// Double-SHA-256 of the signed bytes.
    ///
    /// Identity for logging and content comparison; the supersession key
    /// remains the id.
    pub fn hash(&self) -> [u8; 32] {
        alert_digest(&self.encoded_unsigned)
    }

    /// Whether the alert is still live at `now`.
    pub fn is_in_effect(&self, now: Timestamp) -> bool {
        self.unsigned.is_in_effect(now)
    }

    /// Dissemination decision for this alert at `now`.
    pub fn relay_decision(&self, now: Timestamp) -> RelayDecision {
        self.unsigned.relay_decision(now)
    }
}
