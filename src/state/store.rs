use crate::payload::{validate, validate_scores, FieldKind, FieldValue, Scoreboard, ValidationError};
use crate::projection::Projection;
use crate::snapshot::StoreSnapshot;
use crate::state::entity::{EntityRecord, FieldUpdate, StoreReset, TotalsUpdate};
use crate::state::metrics::IngestMetrics;
use crate::state::metrics_broadcaster::MetricsUpdate;
use crate::topic::{Route, TopicScheme};
use chrono::Utc;
use dashmap::DashMap;
use std::sync::{PoisonError, RwLock};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

/// Result of handing one message to the store.
///
/// Purely informational: the store never fails a delivery.
#[derive(Clone, Debug)]
pub enum IngestOutcome {
    /// Merged into a building record
    Applied(FieldUpdate),
    /// League totals replaced
    TotalsReplaced,
    /// Refused by the validator; no state changed
    Rejected(ValidationError),
    /// Topic not routable to a field; no state changed
    Ignored,
}

impl IngestOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, IngestOutcome::Applied(_) | IngestOutcome::TotalsReplaced)
    }
}

/// Authoritative in-memory state of every building seen on the feed
pub struct EntityStore {
    /// Sharded concurrent map; one entry guard covers one field overwrite
    pub(crate) entities: DashMap<String, EntityRecord>,

    /// League-wide team totals, published outside any building
    totals: RwLock<Scoreboard>,

    /// Topic convention used by `ingest_message`
    topics: TopicScheme,

    /// Broadcast channel for merged field updates
    update_tx: broadcast::Sender<FieldUpdate>,

    /// Broadcast channel for league totals replacements
    totals_tx: broadcast::Sender<TotalsUpdate>,

    /// Broadcast channel for store resets
    reset_tx: broadcast::Sender<StoreReset>,

    /// Metrics tracker for monitoring
    pub metrics: IngestMetrics,

    /// Broadcast channel for metrics updates
    pub(crate) metrics_tx: broadcast::Sender<MetricsUpdate>,
}

impl EntityStore {
    /// Create an empty store using the default topic convention
    pub fn new() -> Self {
        Self::with_topics(TopicScheme::default())
    }

    /// Create an empty store routing topics with `topics`
    pub fn with_topics(topics: TopicScheme) -> Self {
        let (update_tx, _) = broadcast::channel(1000);
        let (totals_tx, _) = broadcast::channel(100);
        let (reset_tx, _) = broadcast::channel(16);
        let (metrics_tx, _) = broadcast::channel(10);

        Self {
            entities: DashMap::new(),
            totals: RwLock::new(Scoreboard::new()),
            topics,
            update_tx,
            totals_tx,
            reset_tx,
            metrics: IngestMetrics::new(),
            metrics_tx,
        }
    }

    pub fn topics(&self) -> &TopicScheme {
        &self.topics
    }

    /// Feed entry point: route `topic` and ingest `raw` accordingly.
    ///
    /// Unroutable topics are logged and dropped.
    pub fn ingest_message(&self, topic: &str, raw: &[u8]) -> IngestOutcome {
        match self.topics.parse(topic) {
            Ok(Some(Route::Field { entity_id, kind })) => self.ingest(&entity_id, kind, raw),
            Ok(Some(Route::Totals)) => self.ingest_totals(raw),
            Ok(None) => {
                self.metrics.record_message();
                self.metrics.record_ignored();
                debug!(topic = %topic, "Ignoring topic without a known field");
                IngestOutcome::Ignored
            }
            Err(e) => {
                self.metrics.record_message();
                self.metrics.record_ignored();
                warn!(topic = %topic, error = %e, "Dropping message on unroutable topic");
                IngestOutcome::Ignored
            }
        }
    }

    /// Validate `raw` as `kind` and merge it into `entity_id`'s record.
    ///
    /// On validation failure the store is untouched and the failure is
    /// logged with the raw payload. This never panics or returns an error.
    pub fn ingest(&self, entity_id: &str, kind: FieldKind, raw: &[u8]) -> IngestOutcome {
        self.metrics.record_message();

        match validate(kind, raw) {
            Ok(value) => IngestOutcome::Applied(self.apply(entity_id, value)),
            Err(e) => {
                self.metrics.record_rejected(&e);
                warn!(
                    entity_id = %entity_id,
                    field = %kind,
                    error = %e,
                    payload = %String::from_utf8_lossy(raw),
                    "Rejected payload"
                );
                IngestOutcome::Rejected(e)
            }
        }
    }

    /// Replace the league totals with a validated scoreboard
    fn ingest_totals(&self, raw: &[u8]) -> IngestOutcome {
        self.metrics.record_message();

        let totals = match validate_scores(raw) {
            Ok(totals) => totals,
            Err(e) => {
                self.metrics.record_rejected(&e);
                warn!(
                    error = %e,
                    payload = %String::from_utf8_lossy(raw),
                    "Rejected league totals"
                );
                return IngestOutcome::Rejected(e);
            }
        };

        *self.totals.write().unwrap_or_else(PoisonError::into_inner) = totals.clone();

        let _ = self.totals_tx.send(TotalsUpdate {
            totals,
            timestamp: Utc::now(),
        });

        IngestOutcome::TotalsReplaced
    }

    /// Get-or-create the record and overwrite one field (core state mutation)
    fn apply(&self, entity_id: &str, value: FieldValue) -> FieldUpdate {
        let kind = value.kind();
        let mut discovered = false;

        {
            // Entry guard held only for the overwrite itself
            let mut record = self
                .entities
                .entry(entity_id.to_string())
                .or_insert_with(|| {
                    discovered = true;
                    EntityRecord::new(entity_id)
                });
            record.apply(value.clone());
        }

        self.metrics.record_applied(entity_id);

        if discovered {
            info!(entity_id = %entity_id, field = %kind, "Discovered building");
        }

        let update = FieldUpdate {
            entity_id: entity_id.to_string(),
            kind,
            value,
            discovered,
            timestamp: Utc::now(),
        };

        // No subscribers is fine
        let _ = self.update_tx.send(update.clone());

        update
    }

    /// Point-in-time copy of every record and the league totals
    pub fn snapshot(&self) -> StoreSnapshot {
        StoreSnapshot::from_store(self)
    }

    /// Render-ready projection of the current state
    pub fn projection(&self) -> Projection {
        self.snapshot().project()
    }

    /// Get one record by building id
    pub fn get_entity(&self, entity_id: &str) -> Option<EntityRecord> {
        self.entities.get(entity_id).map(|e| e.clone())
    }

    /// Copies of all records, including those without a location
    pub fn get_all_entities(&self) -> Vec<EntityRecord> {
        self.entities.iter().map(|e| e.value().clone()).collect()
    }

    /// Current league totals
    pub fn totals(&self) -> Scoreboard {
        self.totals
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of known buildings
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Drop every record and the league totals.
    ///
    /// Used by integrators on a detected feed discontinuity; the store never
    /// calls this itself. Returns the number of records removed.
    pub fn reset(&self) -> usize {
        let mut cleared = 0;
        self.entities.retain(|_, _| {
            cleared += 1;
            false
        });

        *self.totals.write().unwrap_or_else(PoisonError::into_inner) = Scoreboard::new();
        self.metrics.clear_activity();

        let _ = self.reset_tx.send(StoreReset {
            entities_cleared: cleared,
            timestamp: Utc::now(),
        });

        info!(entities_cleared = cleared, "Entity store reset");

        cleared
    }

    /// Subscribe to merged field updates
    pub fn subscribe(&self) -> broadcast::Receiver<FieldUpdate> {
        self.update_tx.subscribe()
    }

    /// Subscribe to league totals replacements
    pub fn subscribe_totals(&self) -> broadcast::Receiver<TotalsUpdate> {
        self.totals_tx.subscribe()
    }

    /// Subscribe to store resets
    pub fn subscribe_resets(&self) -> broadcast::Receiver<StoreReset> {
        self.reset_tx.subscribe()
    }

    /// Subscribe to metrics updates
    pub fn subscribe_metrics(&self) -> broadcast::Receiver<MetricsUpdate> {
        self.metrics_tx.subscribe()
    }
}

impl Default for EntityStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejected_update_leaves_no_record() {
        let store = EntityStore::new();

        let outcome = store.ingest("6", FieldKind::Location, b"[91, 0]");

        assert!(matches!(
            outcome,
            IngestOutcome::Rejected(ValidationError::ShapeOrRange(_))
        ));
        assert!(store.is_empty());
    }

    #[test]
    fn test_update_broadcast() {
        let store = EntityStore::new();
        let mut rx = store.subscribe();

        store.ingest("6", FieldKind::Color, b"[255, 0, 0]");
        store.ingest("6", FieldKind::DisplayName, b"Gregory Gym");

        let first = rx.try_recv().unwrap();
        assert_eq!(first.entity_id, "6");
        assert_eq!(first.kind, FieldKind::Color);
        assert!(first.discovered);

        let second = rx.try_recv().unwrap();
        assert_eq!(second.kind, FieldKind::DisplayName);
        assert!(!second.discovered);
    }

    #[test]
    fn test_rejected_update_not_broadcast() {
        let store = EntityStore::new();
        let mut rx = store.subscribe();

        store.ingest("6", FieldKind::Color, b"[300, 0, 0]");

        assert!(matches!(
            rx.try_recv(),
            Err(tokio::sync::broadcast::error::TryRecvError::Empty)
        ));
    }

    #[test]
    fn test_reset_broadcast() {
        let store = EntityStore::new();
        let mut rx = store.subscribe_resets();

        store.ingest("6", FieldKind::Location, b"[30.28, -97.74]");
        store.ingest("7", FieldKind::Color, b"[1, 2, 3]");

        assert_eq!(store.reset(), 2);

        let reset = rx.try_recv().unwrap();
        assert_eq!(reset.entities_cleared, 2);
    }

    #[test]
    fn test_totals_broadcast() {
        let store = EntityStore::new();
        let mut rx = store.subscribe_totals();

        store.ingest_message("dom/bldg/teams", br#"{"Red": 3, "Blue": 1.5}"#);

        let update = rx.try_recv().unwrap();
        assert_eq!(update.totals.get("Red"), Some(3.0));
    }

    #[test]
    fn test_metrics_follow_outcomes() {
        let store = EntityStore::new();

        store.ingest_message("dom/bldg/6/coord", b"[30.28, -97.74]");
        store.ingest_message("dom/bldg/6/coord", b"not json");
        store.ingest_message("dom/bldg/6/users", br#"{"alice": "x"}"#);
        store.ingest_message("dom/bldg/6/photo", b"...");
        store.ingest_message("owntracks/alice/phone", b"{}");

        let snapshot = store.metrics.get_snapshot(10);
        assert_eq!(snapshot.total_messages, 5);
        assert_eq!(snapshot.applied, 1);
        assert_eq!(snapshot.rejected.malformed, 1);
        assert_eq!(snapshot.rejected.mixed_types, 1);
        assert_eq!(snapshot.ignored, 2);
    }
}
