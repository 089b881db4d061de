use axum::{
    extract::{Query, State},
    routing::get,
    Router,
};
use axum_extra::extract::WithRejection;
use chrono::Utc;
use wayfare_core::search::FlightSearchQuery;

use crate::error::AppError;
use crate::proxy::{cached, Cached};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new().route("/search", get(search_flights))
}

/// GET /api/flights/search
async fn search_flights(
    State(state): State<AppState>,
    WithRejection(Query(query), _): WithRejection<Query<FlightSearchQuery>, AppError>,
) -> Result<Cached, AppError> {
    let query = query.normalized(Utc::now().date_naive())?;
    tracing::info!(
        "Flight search {} -> {} on {}",
        query.origin,
        query.destination,
        query.departure_date
    );

    let ttl = state.cache_ttls.flight_offers_ttl();
    cached(&state, "flightOffers", &query, ttl, "flight_offers", || async {
        Ok::<_, AppError>(state.supplier.search_flights(&query).await?)
    })
    .await
}
