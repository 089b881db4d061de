use axum::{
    extract::{Query, State},
    routing::get,
    Router,
};
use axum_extra::extract::WithRejection;
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use serde_json::json;
use wayfare_core::cache_key::hotel_offers_ttl;
use wayfare_core::iata::normalize_code;
use wayfare_core::search::{hotel_ids_from_listing, HotelOffersQuery, HotelSearchQuery};

use crate::error::AppError;
use crate::proxy::{cache_through, cached, Cached};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/search", get(search_hotels))
        .route("/by-city", get(hotels_by_city))
        .route("/offers", get(hotel_offers))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ByCityParams {
    city_code: String,
    radius: Option<u32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OffersParams {
    /// Comma separated, e.g. `HLPAR001,HLPAR002`.
    hotel_ids: String,
    check_in_date: NaiveDate,
    check_out_date: NaiveDate,
    #[serde(default = "default_adults")]
    adults: u32,
}

fn default_adults() -> u32 {
    1
}

/// The hotel listing for a city, shared by every search in that city.
async fn city_listing(state: &AppState, city_code: &str, radius: Option<u32>) -> Result<Cached, AppError> {
    let params = json!({ "cityCode": city_code, "radius": radius });
    let ttl = state.cache_ttls.hotel_list_ttl();
    cached(state, "hotelList", &params, ttl, "hotel_list", || async {
        Ok::<_, AppError>(state.supplier.hotels_by_city(city_code, radius).await?)
    })
    .await
}

/// GET /api/hotels/search
async fn search_hotels(
    State(state): State<AppState>,
    WithRejection(Query(query), _): WithRejection<Query<HotelSearchQuery>, AppError>,
) -> Result<Cached, AppError> {
    let today = Utc::now().date_naive();
    let query = query.normalized(today)?;
    tracing::info!(
        "Hotel search in {} from {} to {}",
        query.city_code,
        query.check_in_date,
        query.check_out_date
    );

    let ttl = hotel_offers_ttl(query.check_in_date, today);
    // The listing counts its own upstream call, so only the pricing call is recorded here
    cache_through(&state, "hotelOffers", &query, ttl, || async {
        // 1. Resolve the city into hotel ids
        let listing = city_listing(&state, &query.city_code, query.radius).await?;
        let ids = hotel_ids_from_listing(&listing.value, query.max as usize);
        if ids.is_empty() {
            tracing::info!("No hotels listed for {}", query.city_code);
            return Ok(json!({ "data": [] }));
        }

        // 2. Price the first `max` of them
        let offers = query.offers_for(ids).normalized(today)?;
        let result = state.supplier.hotel_offers(&offers).await;
        state.metrics.record_upstream("hotel_offers", result.is_ok());
        Ok::<_, AppError>(result?)
    })
    .await
}

/// GET /api/hotels/by-city
async fn hotels_by_city(
    State(state): State<AppState>,
    WithRejection(Query(params), _): WithRejection<Query<ByCityParams>, AppError>,
) -> Result<Cached, AppError> {
    let city_code = normalize_code("cityCode", &params.city_code)?;
    city_listing(&state, &city_code, params.radius).await
}

/// GET /api/hotels/offers
async fn hotel_offers(
    State(state): State<AppState>,
    WithRejection(Query(params), _): WithRejection<Query<OffersParams>, AppError>,
) -> Result<Cached, AppError> {
    let today = Utc::now().date_naive();
    let query = HotelOffersQuery {
        hotel_ids: params
            .hotel_ids
            .split(',')
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(str::to_string)
            .collect(),
        check_in_date: params.check_in_date,
        check_out_date: params.check_out_date,
        adults: params.adults,
    }
    .normalized(today)?;

    let ttl = hotel_offers_ttl(query.check_in_date, today);
    cached(&state, "hotelOffers", &query, ttl, "hotel_offers", || async {
        Ok::<_, AppError>(state.supplier.hotel_offers(&query).await?)
    })
    .await
}
