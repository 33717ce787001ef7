use crate::payload::ValidationError;
use chrono::Utc;
use serde::Serialize;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

/// Width of the sliding window used for the message rate
const RATE_WINDOW_MS: i64 = 5000;

/// Tracks ingest metrics for the entity store
#[derive(Clone)]
pub struct IngestMetrics {
    /// Feed messages seen (lifetime counter)
    total_messages: Arc<AtomicU64>,

    /// Messages merged into the store
    applied: Arc<AtomicU64>,

    /// Rejections per validation error kind
    rejected_malformed: Arc<AtomicU64>,
    rejected_shape: Arc<AtomicU64>,
    rejected_mixed: Arc<AtomicU64>,

    /// Messages dropped because of their topic (unknown field, foreign prefix)
    ignored: Arc<AtomicU64>,

    /// Message timestamps for rate calculation (sliding 5-second window)
    message_timestamps: Arc<RwLock<VecDeque<i64>>>,

    /// Recently updated buildings (entity_id -> last_applied_timestamp_ms)
    active_entities: Arc<RwLock<HashMap<String, i64>>>,

    /// WebSocket connection count
    websocket_connections: Arc<AtomicU64>,
}

impl IngestMetrics {
    pub fn new() -> Self {
        Self {
            total_messages: Arc::new(AtomicU64::new(0)),
            applied: Arc::new(AtomicU64::new(0)),
            rejected_malformed: Arc::new(AtomicU64::new(0)),
            rejected_shape: Arc::new(AtomicU64::new(0)),
            rejected_mixed: Arc::new(AtomicU64::new(0)),
            ignored: Arc::new(AtomicU64::new(0)),
            message_timestamps: Arc::new(RwLock::new(VecDeque::new())),
            active_entities: Arc::new(RwLock::new(HashMap::new())),
            websocket_connections: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Record an incoming feed message, whatever its outcome
    pub fn record_message(&self) {
        self.total_messages.fetch_add(1, Ordering::Relaxed);

        let now = Utc::now().timestamp_millis();

        let mut timestamps = self
            .message_timestamps
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        timestamps.push_back(now);

        while let Some(&oldest) = timestamps.front() {
            if now - oldest > RATE_WINDOW_MS {
                timestamps.pop_front();
            } else {
                break;
            }
        }
    }

    /// Record a message merged into `entity_id`
    pub fn record_applied(&self, entity_id: &str) {
        self.applied.fetch_add(1, Ordering::Relaxed);

        let now = Utc::now().timestamp_millis();
        self.active_entities
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(entity_id.to_string(), now);
    }

    /// Record a message refused by the validator
    pub fn record_rejected(&self, error: &ValidationError) {
        let counter = match error {
            ValidationError::Malformed(_) => &self.rejected_malformed,
            ValidationError::ShapeOrRange(_) => &self.rejected_shape,
            ValidationError::MixedTypes { .. } => &self.rejected_mixed,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a message dropped because of its topic
    pub fn record_ignored(&self) {
        self.ignored.fetch_add(1, Ordering::Relaxed);
    }

    /// Forget per-entity activity (store reset)
    pub fn clear_activity(&self) {
        self.active_entities
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    /// Messages per second over the last 5 seconds
    pub fn get_message_rate(&self) -> f64 {
        let threshold = Utc::now().timestamp_millis() - RATE_WINDOW_MS;

        // Count against now; pruning only happens on the write path
        let recent = self
            .message_timestamps
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|&&timestamp| timestamp >= threshold)
            .count();
        recent as f64 / (RATE_WINDOW_MS as f64 / 1000.0)
    }

    /// Buildings updated within the last `window_seconds`
    pub fn get_active_entity_count(&self, window_seconds: i64) -> usize {
        let now = Utc::now().timestamp_millis();
        let threshold = now - (window_seconds * 1000);

        self.active_entities
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .filter(|&&last_seen| last_seen > threshold)
            .count()
    }

    pub fn increment_ws_connection(&self) {
        self.websocket_connections.fetch_add(1, Ordering::Relaxed);
    }

    pub fn decrement_ws_connection(&self) {
        self.websocket_connections.fetch_sub(1, Ordering::Relaxed);
    }

    pub fn get_ws_connection_count(&self) -> u64 {
        self.websocket_connections.load(Ordering::Relaxed)
    }

    pub fn get_total_messages(&self) -> u64 {
        self.total_messages.load(Ordering::Relaxed)
    }

    /// Get snapshot of all metrics
    pub fn get_snapshot(&self, active_window_seconds: i64) -> MetricsSnapshot {
        MetricsSnapshot {
            total_messages: self.get_total_messages(),
            applied: self.applied.load(Ordering::Relaxed),
            rejected: RejectedCounts {
                malformed: self.rejected_malformed.load(Ordering::Relaxed),
                shape_or_range: self.rejected_shape.load(Ordering::Relaxed),
                mixed_types: self.rejected_mixed.load(Ordering::Relaxed),
            },
            ignored: self.ignored.load(Ordering::Relaxed),
            message_rate: self.get_message_rate(),
            active_entities: self.get_active_entity_count(active_window_seconds),
            websocket_connections: self.get_ws_connection_count(),
        }
    }
}

impl Default for IngestMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of metrics at a point in time
#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    pub total_messages: u64,
    pub applied: u64,
    pub rejected: RejectedCounts,
    pub ignored: u64,
    pub message_rate: f64,
    pub active_entities: usize,
    pub websocket_connections: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RejectedCounts {
    pub malformed: u64,
    pub shape_or_range: u64,
    pub mixed_types: u64,
}

impl RejectedCounts {
    pub fn total(&self) -> u64 {
        self.malformed + self.shape_or_range + self.mixed_types
    }
}
