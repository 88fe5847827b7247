//! System clock adapter.

use std::time::{SystemTime, UNIX_EPOCH};

use klaxon_core::alert::Timestamp;

use crate::ports::outbound::TimeSource;

/// Wall-clock time source backed by [`SystemTime`].
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemTimeSource;

impl TimeSource for SystemTimeSource {
    fn now(&self) -> Timestamp {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs() as Timestamp
    }
}
