use async_trait::async_trait;
use serde_json::Value;

use crate::search::{FlightSearchQuery, HotelOffersQuery, InspirationQuery, LocationQuery};
use crate::CoreResult;

/// Upstream travel-content provider. Responses are passed through to the
/// client as returned by the provider.
#[async_trait]
pub trait TravelSupplier: Send + Sync {
    fn name(&self) -> &str;

    async fn search_flights(&self, query: &FlightSearchQuery) -> CoreResult<Value>;

    /// Hotels located in a city, optionally within `radius` km of its centre.
    async fn hotels_by_city(&self, city_code: &str, radius: Option<u32>) -> CoreResult<Value>;

    async fn hotel_offers(&self, query: &HotelOffersQuery) -> CoreResult<Value>;

    async fn search_locations(&self, query: &LocationQuery) -> CoreResult<Value>;

    /// Cheapest destinations reachable from an origin.
    async fn flight_inspiration(&self, query: &InspirationQuery) -> CoreResult<Value>;
}
