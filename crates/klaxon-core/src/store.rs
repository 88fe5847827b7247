//! # Alert Store
//!
//! Process-wide table of verified, non-expired alerts.
//!
//! Each alert id moves through one lifecycle:
//!
//! ```text
//! Unknown ──submit──▶ Active ──cancel──▶ Cancelled (terminal)
//!                        │
//!                        └───expiry───▶ Expired (terminal)
//! ```
//!
//! Terminal states are remembered for the process lifetime so an id can
//! never return to Active, even after the entry leaves the active set.
//! Nothing is persisted; store contents vanish on restart by design.

use std::collections::{BTreeMap, HashMap};

use crate::alert::{AlertId, SignedAlert, Timestamp, FINAL_ALERT_ID};
use crate::errors::Rejection;
use crate::signing::KeyRing;

/// Lifecycle state of an alert id as seen by the store.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AlertStatus {
    /// Never seen.
    Unknown,
    /// Currently live.
    Active,
    /// Terminally cancelled by another alert.
    Cancelled,
    /// Terminally expired.
    Expired,
}

/// Outcome of a successful submission.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Accepted {
    /// False when the submission was an identical-content no-op; controls
    /// whether the caller re-disseminates.
    pub newly_inserted: bool,
    /// Ids this acceptance transitioned to Cancelled.
    pub cancelled: Vec<AlertId>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum TerminalState {
    Cancelled { by: AlertId },
    Expired,
}

/// In-memory table of known alerts with supersession and expiry logic.
///
/// A plain value: callers that share it across threads wrap it in their own
/// lock. All mutation funnels through [`AlertStore::submit`] and
/// [`AlertStore::sweep`].
#[derive(Debug, Default)]
pub struct AlertStore {
    active: BTreeMap<AlertId, SignedAlert>,
    terminal: HashMap<AlertId, TerminalState>,
}

impl AlertStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Admits an alert through the full verification chain.
    ///
    /// The same path serves operator submissions and network-received
    /// alerts. Checks run in order against the unmodified store; the store
    /// only mutates once the alert is accepted:
    ///
    /// 1. Signature must verify against the ring.
    /// 2. The alert must not already be expired (the store also sweeps
    ///    lazily here, so stale residents never influence the outcome).
    /// 3. The reserved final id is only accepted in canonical form.
    /// 4. Terminally Cancelled ids stay cancelled; terminally Expired ids
    ///    reject reuse. A live alert with a different id whose cancellation
    ///    covers this id blocks it, unless the incoming alert cancels the
    ///    blocker in turn: the newcomer's cancellations take effect first,
    ///    so mutual cancellation resolves in favor of the incoming alert.
    ///    The stored final alert is exempt and can never be displaced.
    /// 5. A live same-id entry makes identical content an idempotent no-op;
    ///    different content is a duplicate unless the incoming alert cancels
    ///    its own id, which replaces the stored content (the lineage stays
    ///    Active).
    ///
    /// On acceptance, every live alert this one cancels transitions to
    /// Cancelled before the insert.
    pub fn submit(
        &mut self,
        alert: SignedAlert,
        keys: &KeyRing,
        now: Timestamp,
    ) -> Result<Accepted, Rejection> {
        if !keys.verify(&alert.encoded_unsigned, &alert.signature) {
            return Err(Rejection::InvalidSignature);
        }

        let id = alert.id();
        if alert.unsigned.is_expired(now) {
            return Err(Rejection::AlreadyExpired {
                id,
                expiration: alert.unsigned.expiration,
                now,
            });
        }

        if id == FINAL_ALERT_ID && !alert.unsigned.is_valid_final_alert() {
            return Err(Rejection::InvalidFinalAlert(id));
        }

        self.sweep(now);

        match self.terminal.get(&id) {
            Some(TerminalState::Cancelled { by }) => {
                return Err(Rejection::Cancelled { id, by: *by });
            }
            Some(TerminalState::Expired) => {
                return Err(Rejection::DuplicateId(id));
            }
            None => {}
        }

        // A stored canceller that this alert cancels in turn does not
        // block it; its removal is applied on acceptance below.
        if let Some(blocker) = self.active.values().find(|stored| {
            stored.id() != id
                && stored.unsigned.cancels(id)
                && !Self::displaces(&alert, stored.id())
        }) {
            return Err(Rejection::Cancelled {
                id,
                by: blocker.id(),
            });
        }

        if let Some(existing) = self.active.get(&id) {
            let identical = existing.encoded_unsigned == alert.encoded_unsigned
                && existing.signature == alert.signature;
            if identical {
                return Ok(Accepted {
                    newly_inserted: false,
                    cancelled: Vec::new(),
                });
            }
            if !alert.unsigned.cancels(id) {
                return Err(Rejection::DuplicateId(id));
            }
            // Supersession: the incoming alert explicitly cancels its own id
            // and replaces the stored content.
        }

        let cancelled: Vec<AlertId> = self
            .active
            .keys()
            .filter(|stored_id| **stored_id != id && Self::displaces(&alert, **stored_id))
            .copied()
            .collect();
        for victim in &cancelled {
            self.active.remove(victim);
            self.terminal
                .insert(*victim, TerminalState::Cancelled { by: id });
        }

        self.active.insert(id, alert);
        Ok(Accepted {
            newly_inserted: true,
            cancelled,
        })
    }

    /// Whether an incoming alert removes the stored entry under `stored_id`.
    ///
    /// The reserved final alert is never displaced, whatever an incoming
    /// alert claims to cancel.
    fn displaces(incoming: &SignedAlert, stored_id: AlertId) -> bool {
        stored_id != FINAL_ALERT_ID && incoming.unsigned.cancels(stored_id)
    }

    /// Transitions every expired live alert to its terminal Expired state.
    ///
    /// Returns the ids that expired, for the caller to log. Invoked on the
    /// dissemination timer and lazily inside [`AlertStore::submit`].
    pub fn sweep(&mut self, now: Timestamp) -> Vec<AlertId> {
        let expired: Vec<AlertId> = self
            .active
            .iter()
            .filter(|(_, alert)| alert.unsigned.is_expired(now))
            .map(|(id, _)| *id)
            .collect();
        for id in &expired {
            self.active.remove(id);
            self.terminal.insert(*id, TerminalState::Expired);
        }
        expired
    }

    /// Live, in-effect alerts that apply to the given protocol version and
    /// sub-version, ordered by descending priority then ascending id.
    pub fn active_alerts(
        &self,
        version: u32,
        sub_version: &str,
        now: Timestamp,
    ) -> Vec<SignedAlert> {
        let mut alerts: Vec<SignedAlert> = self
            .active
            .values()
            .filter(|alert| {
                alert.is_in_effect(now) && alert.unsigned.applies_to(version, sub_version)
            })
            .cloned()
            .collect();
        alerts.sort_by(|a, b| {
            b.unsigned
                .priority
                .cmp(&a.unsigned.priority)
                .then(a.id().cmp(&b.id()))
        });
        alerts
    }

    /// Every live, in-effect alert regardless of applicability, id-ascending.
    ///
    /// The dissemination layer relays all in-effect alerts, not only those
    /// that apply to the local node's own version.
    pub fn all_active(&self, now: Timestamp) -> Vec<SignedAlert> {
        self.active
            .values()
            .filter(|alert| alert.is_in_effect(now))
            .cloned()
            .collect()
    }

    /// Lifecycle state of an id.
    pub fn status(&self, id: AlertId) -> AlertStatus {
        if self.active.contains_key(&id) {
            return AlertStatus::Active;
        }
        match self.terminal.get(&id) {
            Some(TerminalState::Cancelled { .. }) => AlertStatus::Cancelled,
            Some(TerminalState::Expired) => AlertStatus::Expired,
            None => AlertStatus::Unknown,
        }
    }

    /// The live alert stored under an id, if any.
    pub fn get(&self, id: AlertId) -> Option<&SignedAlert> {
        self.active.get(&id)
    }

    /// Number of live alerts.
    pub fn len(&self) -> usize {
        self.active.len()
    }

    /// Whether no live alerts are stored.
    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }
}
