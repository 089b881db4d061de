use axum::{
    extract::{Query, State},
    routing::get,
    Router,
};
use axum_extra::extract::WithRejection;
use serde::Deserialize;
use wayfare_core::search::{InspirationQuery, LocationQuery, LocationSubType};

use crate::error::AppError;
use crate::proxy::{cached, Cached};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/locations", get(search_locations))
        .route("/airports", get(search_airports))
        .route("/cities", get(search_cities))
        .route("/inspiration", get(flight_inspiration))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LocationParams {
    keyword: String,
    sub_type: Option<String>,
}

#[derive(Debug, Deserialize)]
struct KeywordParams {
    keyword: String,
}

async fn lookup(state: &AppState, query: LocationQuery) -> Result<Cached, AppError> {
    let ttl = state.cache_ttls.locations_ttl();
    cached(state, "locations", &query, ttl, "locations", || async {
        Ok::<_, AppError>(state.supplier.search_locations(&query).await?)
    })
    .await
}

/// GET /api/destinations/locations
async fn search_locations(
    State(state): State<AppState>,
    WithRejection(Query(params), _): WithRejection<Query<LocationParams>, AppError>,
) -> Result<Cached, AppError> {
    let sub_types = match params.sub_type.as_deref() {
        Some(raw) => LocationSubType::parse_list(raw)?,
        None => vec![LocationSubType::Airport, LocationSubType::City],
    };
    lookup(&state, LocationQuery::new(&params.keyword, sub_types)?).await
}

/// GET /api/destinations/airports
async fn search_airports(
    State(state): State<AppState>,
    WithRejection(Query(params), _): WithRejection<Query<KeywordParams>, AppError>,
) -> Result<Cached, AppError> {
    let query = LocationQuery::new(&params.keyword, vec![LocationSubType::Airport])?;
    lookup(&state, query).await
}

/// GET /api/destinations/cities
async fn search_cities(
    State(state): State<AppState>,
    WithRejection(Query(params), _): WithRejection<Query<KeywordParams>, AppError>,
) -> Result<Cached, AppError> {
    let query = LocationQuery::new(&params.keyword, vec![LocationSubType::City])?;
    lookup(&state, query).await
}

/// GET /api/destinations/inspiration
async fn flight_inspiration(
    State(state): State<AppState>,
    WithRejection(Query(query), _): WithRejection<Query<InspirationQuery>, AppError>,
) -> Result<Cached, AppError> {
    let query = query.normalized()?;
    let ttl = state.cache_ttls.inspiration_ttl();
    cached(&state, "inspiration", &query, ttl, "inspiration", || async {
        Ok::<_, AppError>(state.supplier.flight_inspiration(&query).await?)
    })
    .await
}
