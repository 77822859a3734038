//! Heartbeat ping/pong liveness monitoring.

use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;

use tokio::time;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::connection::ClientConnection;

/// Outcome of the heartbeat loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeartbeatResult {
    /// The client stopped responding within the timeout window.
    TimedOut,
    /// The heartbeat was cancelled externally.
    Cancelled,
}

/// Run heartbeat checks for a connection.
///
/// At each `interval` tick a ping frame is queued toward the client and
/// the alive flag is checked. If the client showed no activity since the
/// last tick (a pong answers the ping via the read loop) the missed-pong
/// counter increments. Once `max_missed` consecutive misses are reached
/// the connection is considered dead and `HeartbeatResult::TimedOut` is
/// returned.
///
/// `max_missed` is computed as `timeout / interval` at millisecond
/// granularity (clamped to at least 1).
pub async fn run_heartbeat(
    connection: Arc<ClientConnection>,
    interval: Duration,
    timeout: Duration,
    cancel: CancellationToken,
) -> HeartbeatResult {
    let mut check_interval = time::interval(interval);
    let mut missed_pongs: u32 = 0;
    let interval_ms = interval.as_millis().max(1);
    #[allow(clippy::cast_possible_truncation)]
    let max_missed = (timeout.as_millis() / interval_ms).max(1) as u32;

    loop {
        tokio::select! {
            _ = check_interval.tick() => {
                if connection.check_alive() {
                    missed_pongs = 0;
                } else {
                    missed_pongs += 1;
                    if missed_pongs >= max_missed {
                        return HeartbeatResult::TimedOut;
                    }
                }
                // Not alive again until the next pong arrives
                connection.is_alive.store(false, Ordering::Relaxed);
                if !connection.send_ping() {
                    debug!(conn_id = %connection.id, "ping not queued, outbound channel unavailable");
                }
            }
            () = cancel.cancelled() => {
                return HeartbeatResult::Cancelled;
            }
        }
    }
}
