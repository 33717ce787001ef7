use crate::api::query::ApiError;
use crate::state::{EntityStore, MetricsSnapshot};
use axum::{
    extract::State,
    http::HeaderMap,
    response::Json,
    routing::{get, post},
    Router,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::info;

/// State for the admin API.
pub struct AdminAppState {
    pub store: Arc<EntityStore>,
    /// Required bearer token for POST /api/admin/reset. None = unrestricted.
    pub admin_token: Option<String>,
    /// Window used for the active building count (seconds)
    pub active_window_seconds: i64,
}

/// Ingest statistics
#[derive(Serialize)]
pub struct StatsResponse {
    pub entity_count: usize,
    pub totals_entries: usize,
    #[serde(flatten)]
    pub metrics: MetricsSnapshot,
}

#[derive(Serialize)]
pub struct ResetResponse {
    pub entities_cleared: usize,
}

pub fn create_admin_router(state: Arc<AdminAppState>) -> Router {
    Router::new()
        .route("/api/admin/stats", get(get_stats))
        .route("/api/admin/reset", post(reset_store))
        .with_state(state)
}

/// GET /api/admin/stats - current ingest counters.
async fn get_stats(State(state): State<Arc<AdminAppState>>) -> Json<StatsResponse> {
    Json(StatsResponse {
        entity_count: state.store.len(),
        totals_entries: state.store.totals().len(),
        metrics: state.store.metrics.get_snapshot(state.active_window_seconds),
    })
}

/// POST /api/admin/reset - drop every building. Requires the admin bearer token.
async fn reset_store(
    State(state): State<Arc<AdminAppState>>,
    headers: HeaderMap,
) -> Result<Json<ResetResponse>, ApiError> {
    if !validate_admin_token(&headers, &state.admin_token) {
        return Err(ApiError::Unauthorized);
    }

    let entities_cleared = state.store.reset();
    info!(entities_cleared, "Store reset via admin API");

    Ok(Json(ResetResponse { entities_cleared }))
}

/// Returns true if the bearer token in `Authorization` matches the expected admin token.
/// Returns true (no restriction) when `expected` is None.
fn validate_admin_token(headers: &HeaderMap, expected: &Option<String>) -> bool {
    let Some(expected_token) = expected else {
        // No admin token configured → reset is unrestricted (dev mode)
        return true;
    };

    let Some(auth_header) = headers.get("Authorization") else {
        return false;
    };
    let Ok(value) = auth_header.to_str() else {
        return false;
    };
    let Some(token) = value.strip_prefix("Bearer ") else {
        return false;
    };

    token == expected_token
}
