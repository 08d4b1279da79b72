//! Idle detection for connections whose transport died without a close frame.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::time;
use tracing::{debug, warn};

use super::handle::{CloseReason, ConnectionHandle};

/// Watches a single connection and closes it when inactivity exceeds the
/// idle window.
///
/// Any inbound frame (heartbeats included) refreshes activity, so a healthy
/// client is never cut. The loop ends as soon as a close is underway, whatever
/// initiated it.
pub async fn run_idle_monitor(
    handle: Arc<ConnectionHandle>,
    check_interval: Duration,
    idle_timeout: Duration,
) {
    let mut ticker = time::interval(check_interval);
    ticker.set_missed_tick_behavior(time::MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;

        if handle.is_closing() {
            break;
        }

        let idle = Utc::now() - handle.last_activity().await;
        if let Ok(idle) = idle.to_std() {
            if idle > idle_timeout {
                warn!(
                    conn_id = %handle.id,
                    user_id = %handle.user_id,
                    idle_seconds = idle.as_secs(),
                    "Idle timeout, closing connection"
                );
                handle.begin_close(CloseReason::IdleTimeout);
                break;
            }
        }
    }

    debug!(conn_id = %handle.id, "Idle monitor ended");
}
