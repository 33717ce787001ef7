use crate::payload::Scoreboard;
use crate::projection::Projection;
use crate::state::{EntityRecord, EntityStore};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;


/// Immutable copy of the store at one point in time.
///
/// Each record reflects whole updates only: a field overwrite in flight is
/// either fully visible or not at all. Later store mutations never show up
/// here.
#[derive(Clone, Debug, Serialize)]
pub struct StoreSnapshot {
    /// When the copy was taken
    pub taken_at: DateTime<Utc>,

    /// All records at snapshot time (entity_id -> record)
    pub entities: HashMap<String, EntityRecord>,

    /// League totals at snapshot time
    pub totals: Scoreboard,
}

impl StoreSnapshot {
    /// Copy the current contents of `store`
    pub fn from_store(store: &EntityStore) -> Self {
        let entities: HashMap<String, EntityRecord> = store
            .entities
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect();

        Self {
            taken_at: Utc::now(),
            entities,
            totals: store.totals(),
        }
    }

    pub fn get(&self, entity_id: &str) -> Option<&EntityRecord> {
        self.entities.get(entity_id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &EntityRecord> {
        self.entities.values()
    }

    /// Get entity count (for logging/display)
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// Flatten into the render-ready projection
    pub fn project(&self) -> Projection {
        Projection::from_records(self.entities.values())
    }

    /// Convert into the raw record map
    pub fn into_entities(self) -> HashMap<String, EntityRecord> {
        self.entities
    }
}
