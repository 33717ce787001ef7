use crate::payload::Scoreboard;
use crate::projection::Projection;
use crate::state::{EntityRecord, EntityStore};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Shared state for query API
pub struct QueryAppState {
    pub store: Arc<EntityStore>,
}

/// Query parameters for the building projection
#[derive(Deserialize, Default)]
pub struct BuildingQueryParams {
    /// Emit coordinates as `[lng, lat]` instead of the published `[lat, lng]`
    #[serde(default)]
    pub lng_lat: bool,
}

/// Projection plus league totals, as consumed by the map
#[derive(Serialize)]
pub struct BuildingsResponse {
    #[serde(flatten)]
    pub projection: Projection,
    pub totals: Scoreboard,
}

/// One ranked scoreboard entry
#[derive(Serialize)]
pub struct RankedEntry {
    pub name: String,
    pub score: f64,
}

/// League totals, raw and ranked
#[derive(Serialize)]
pub struct TotalsResponse {
    pub totals: Scoreboard,
    pub ranked: Vec<RankedEntry>,
}

/// Error response
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

/// Create query API router
pub fn create_query_router(state: Arc<QueryAppState>) -> Router {
    Router::new()
        .route("/api/buildings", get(list_buildings))
        .route("/api/buildings/:id", get(get_building))
        .route("/api/totals", get(get_totals))
        .with_state(state)
}

/// GET /api/buildings - Render-ready projection
///
/// Only buildings with a valid location are included; arrays are index
/// aligned. `?lng_lat=true` flips coordinates for `[lng, lat]` widgets.
async fn list_buildings(
    State(state): State<Arc<QueryAppState>>,
    Query(params): Query<BuildingQueryParams>,
) -> Json<BuildingsResponse> {
    let snapshot = state.store.snapshot();
    let mut projection = snapshot.project();

    if params.lng_lat {
        projection.coordinates = projection.coordinates_lng_lat();
    }

    Json(BuildingsResponse {
        projection,
        totals: snapshot.totals,
    })
}

/// GET /api/buildings/:id - Raw record, including buildings without a location
async fn get_building(
    State(state): State<Arc<QueryAppState>>,
    Path(id): Path<String>,
) -> Result<Json<EntityRecord>, ApiError> {
    let record = state.store.get_entity(&id).ok_or(ApiError::NotFound)?;
    Ok(Json(record))
}

/// GET /api/totals - League-wide team totals
async fn get_totals(State(state): State<Arc<QueryAppState>>) -> Json<TotalsResponse> {
    let totals = state.store.totals();
    let ranked = totals
        .ranked()
        .into_iter()
        .map(|(name, score)| RankedEntry {
            name: name.to_string(),
            score,
        })
        .collect();

    Json(TotalsResponse { totals, ranked })
}

/// API error types
#[derive(Debug)]
pub enum ApiError {
    NotFound,
    Unauthorized,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            ApiError::NotFound => (StatusCode::NOT_FOUND, "Building not found"),
            ApiError::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized"),
        };

        let body = Json(ErrorResponse {
            error: error_message.to_string(),
        });

        (status, body).into_response()
    }
}
