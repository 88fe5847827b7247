//! Test utilities for the alert relay.
//!
//! Deterministic implementations of the outbound ports for tests that need
//! to control time.
//!
//! # Example
//!
//! ```rust
//! use klaxon_relay::test_utils::FixedTimeSource;
//! use klaxon_relay::TimeSource;
//!
//! let clock = FixedTimeSource::new(1_700_000_000);
//! clock.advance(900);
//! assert_eq!(clock.now(), 1_700_000_900);
//! ```

use std::sync::atomic::{AtomicI64, Ordering};

use klaxon_core::alert::Timestamp;

use crate::ports::outbound::TimeSource;

/// A manually advanced clock for lifecycle tests.
///
/// Shared freely across tasks; advancing it moves logical time for every
/// holder at once.
#[derive(Debug)]
pub struct FixedTimeSource {
    now: AtomicI64,
}

impl FixedTimeSource {
    /// Creates a clock pinned at `now`.
    pub fn new(now: Timestamp) -> Self {
        Self {
            now: AtomicI64::new(now),
        }
    }

    /// Moves the clock forward by `secs` seconds.
    pub fn advance(&self, secs: i64) {
        self.now.fetch_add(secs, Ordering::SeqCst);
    }

    /// Pins the clock to a new instant.
    pub fn set(&self, now: Timestamp) {
        self.now.store(now, Ordering::SeqCst);
    }
}

impl TimeSource for FixedTimeSource {
    fn now(&self) -> Timestamp {
        self.now.load(Ordering::SeqCst)
    }
}
