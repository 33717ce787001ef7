use crate::payload::{FieldKind, FieldValue, Scoreboard};
use crate::state::{FieldUpdate, MetricsUpdate, RejectedCounts, StoreReset, TotalsUpdate};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Client → Server message types
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type")]
pub enum ClientMessage {
    #[serde(rename = "subscribe")]
    Subscribe { entity_id: String },
    #[serde(rename = "unsubscribe")]
    Unsubscribe { entity_id: String },
}

/// Server → Client: one building field changed
#[derive(Debug, Clone, Serialize)]
pub struct FieldUpdateMessage {
    #[serde(rename = "type")]
    pub msg_type: String,
    pub entity_id: String,
    pub field: FieldKind,
    pub value: Value,
    pub discovered: bool,
    pub timestamp: DateTime<Utc>,
}

impl From<FieldUpdate> for FieldUpdateMessage {
    fn from(update: FieldUpdate) -> Self {
        let value = match update.value {
            FieldValue::Location(location) => serde_json::json!(location.lat_lng()),
            FieldValue::Color(color) => Value::String(color.to_hex()),
            FieldValue::DisplayName(name) => name.map(Value::String).unwrap_or(Value::Null),
            FieldValue::TeamScores(scores) | FieldValue::UserScores(scores) => {
                serde_json::to_value(scores).unwrap_or(Value::Null)
            }
        };

        Self {
            msg_type: "field_update".to_string(),
            entity_id: update.entity_id,
            field: update.kind,
            value,
            discovered: update.discovered,
            timestamp: update.timestamp,
        }
    }
}

/// Server → Client: league totals replaced
#[derive(Debug, Clone, Serialize)]
pub struct TotalsUpdateMessage {
    #[serde(rename = "type")]
    pub msg_type: String,
    pub totals: Scoreboard,
    pub timestamp: DateTime<Utc>,
}

impl From<TotalsUpdate> for TotalsUpdateMessage {
    fn from(update: TotalsUpdate) -> Self {
        Self {
            msg_type: "totals_update".to_string(),
            totals: update.totals,
            timestamp: update.timestamp,
        }
    }
}

/// Server → Client: every building was dropped; clients should refetch
#[derive(Debug, Clone, Serialize)]
pub struct StoreResetMessage {
    #[serde(rename = "type")]
    pub msg_type: String,
    pub entities_cleared: usize,
    pub timestamp: DateTime<Utc>,
}

impl From<StoreReset> for StoreResetMessage {
    fn from(reset: StoreReset) -> Self {
        Self {
            msg_type: "store_reset".to_string(),
            entities_cleared: reset.entities_cleared,
            timestamp: reset.timestamp,
        }
    }
}

/// Server → Client: Metrics update notification
#[derive(Debug, Clone, Serialize)]
pub struct MetricsUpdateMessage {
    #[serde(rename = "type")]
    pub msg_type: String,
    pub timestamp: DateTime<Utc>,
    pub entities: MetricsEntityCount,
    pub messages: MetricsMessages,
    pub websocket: MetricsWebSocket,
}

#[derive(Debug, Clone, Serialize)]
pub struct MetricsEntityCount {
    pub total: usize,
    pub active: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct MetricsMessages {
    pub total: u64,
    pub applied: u64,
    pub rejected: RejectedCounts,
    pub ignored: u64,
    pub rate_per_second: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct MetricsWebSocket {
    pub connections: u64,
}

impl From<MetricsUpdate> for MetricsUpdateMessage {
    fn from(update: MetricsUpdate) -> Self {
        Self {
            msg_type: "metrics_update".to_string(),
            timestamp: Utc::now(),
            entities: MetricsEntityCount {
                total: update.entity_count,
                active: update.active_entities,
            },
            messages: MetricsMessages {
                total: update.total_messages,
                applied: update.applied,
                rejected: update.rejected,
                ignored: update.ignored,
                rate_per_second: update.message_rate,
            },
            websocket: MetricsWebSocket {
                connections: update.websocket_connections,
            },
        }
    }
}

/// Server → Client: Error message
#[derive(Debug, Clone, Serialize)]
pub struct ErrorMessage {
    #[serde(rename = "type")]
    pub msg_type: String,
    pub error: String,
}

impl ErrorMessage {
    pub fn new(error: String) -> Self {
        Self {
            msg_type: "error".to_string(),
            error,
        }
    }
}
