use crate::state::metrics::RejectedCounts;
use crate::state::EntityStore;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{interval, MissedTickBehavior};
use tracing::warn;

/// Periodically broadcast ingest metrics to all subscribers
///
/// Runs in the background and never touches the entity map beyond reading
/// its length.
pub async fn run_metrics_broadcaster(
    store: Arc<EntityStore>,
    interval_seconds: u64,
    active_window_seconds: i64,
) {
    let mut ticker = interval(Duration::from_secs(interval_seconds.max(1)));

    // Skip missed ticks to prevent backlog under load
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        ticker.tick().await;

        let update = MetricsUpdate::collect(&store, active_window_seconds);

        // No subscribers is fine
        if store.metrics_tx.send(update).is_err() && store.metrics_tx.receiver_count() > 0 {
            warn!("No metrics subscribers available");
        }
    }
}

/// Metrics update message broadcast to WebSocket clients
#[derive(Debug, Clone, serde::Serialize)]
pub struct MetricsUpdate {
    pub entity_count: usize,
    pub total_messages: u64,
    pub applied: u64,
    pub rejected: RejectedCounts,
    pub ignored: u64,
    pub message_rate: f64,
    pub active_entities: usize,
    pub websocket_connections: u64,
}

impl MetricsUpdate {
    /// Gather current counters from `store`
    pub fn collect(store: &EntityStore, active_window_seconds: i64) -> Self {
        let snapshot = store.metrics.get_snapshot(active_window_seconds);

        Self {
            entity_count: store.len(),
            total_messages: snapshot.total_messages,
            applied: snapshot.applied,
            rejected: snapshot.rejected,
            ignored: snapshot.ignored,
            message_rate: snapshot.message_rate,
            active_entities: snapshot.active_entities,
            websocket_connections: snapshot.websocket_connections,
        }
    }
}
