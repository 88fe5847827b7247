//! # Relay Worker
//!
//! Background task driving the time-based half of dissemination: expiry
//! sweeps and re-flood passes for alerts still inside their relay window.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing::{debug, info};

use crate::ports::outbound::{PeerTransport, TimeSource};
use crate::service::AlertRelayService;

/// Runs the periodic relay loop until the shutdown signal fires.
///
/// The loop does not start until the transport reports at least one
/// connected peer, polling at `peer_poll_interval_ms`. Broadcast-and-exit
/// operator tools rely on this: an alert submitted before any peer exists
/// is delivered by the first tick instead of vanishing into an empty
/// network.
pub async fn run<T, C>(service: Arc<AlertRelayService<T, C>>, mut shutdown: watch::Receiver<bool>)
where
    T: PeerTransport + 'static,
    C: TimeSource + 'static,
{
    let poll = Duration::from_millis(service.config().peer_poll_interval_ms);
    while !service.has_peers() {
        tokio::select! {
            _ = tokio::time::sleep(poll) => {}
            _ = shutdown.changed() => {
                info!("Relay worker shutting down before any peer connected");
                return;
            }
        }
    }
    info!("Relay worker active");

    let mut tick =
        tokio::time::interval(Duration::from_millis(service.config().sweep_interval_ms));
    loop {
        tokio::select! {
            _ = tick.tick() => {
                let reached = service.sweep_and_flood();
                if reached > 0 {
                    debug!("Relay pass delivered {} alert(s)", reached);
                }
            }
            _ = shutdown.changed() => {
                info!("Relay worker shutting down");
                return;
            }
        }
    }
}
