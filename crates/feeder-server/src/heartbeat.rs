//! Periodic ping to every open connection.
//!
//! Dead peers are not timed out here. A ping that cannot be delivered makes
//! the connection's writer fail, which tears the session down.

use crate::state::AppState;
use feeder_core::SessionRegistry;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, trace};

pub fn spawn_heartbeat(state: Arc<AppState>) -> JoinHandle<()> {
    let period = state.config.ping_interval();
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            let sent = ping_all(&state.sessions);
            trace!(target: "feeder::ws::ping", "Pinged {} connections", sent);
        }
    })
}

/// Queue a ping on every registered connection. Returns how many were queued.
pub fn ping_all(sessions: &SessionRegistry) -> usize {
    let mut sent = 0;
    for (key, connection) in sessions.connections() {
        if connection.is_closed() {
            debug!(target: "feeder::ws::ping", "[{}] Connection closing, skipping ping", key);
            continue;
        }
        if connection.try_ping() {
            sent += 1;
        } else {
            debug!(target: "feeder::ws::ping", "[{}] Outbound queue full, ping skipped", key);
        }
    }
    sent
}
