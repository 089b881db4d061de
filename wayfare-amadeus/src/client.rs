use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, warn};
use wayfare_core::search::{FlightSearchQuery, HotelOffersQuery, InspirationQuery, LocationQuery};
use wayfare_core::supplier::TravelSupplier;
use wayfare_core::CoreResult;
use wayfare_store::app_config::AmadeusConfig;

use crate::error::AmadeusError;
use crate::token::{ClientCredentials, TokenCache, TokenFetcher};

const FLIGHT_OFFERS_PATH: &str = "/v2/shopping/flight-offers";
const HOTELS_BY_CITY_PATH: &str = "/v1/reference-data/locations/hotels/by-city";
const HOTEL_OFFERS_PATH: &str = "/v3/shopping/hotel-offers";
const LOCATIONS_PATH: &str = "/v1/reference-data/locations";
const FLIGHT_DESTINATIONS_PATH: &str = "/v1/shopping/flight-destinations";

/// Self-service Amadeus API client.
pub struct AmadeusClient {
    http: reqwest::Client,
    base_url: String,
    tokens: TokenCache,
}

impl AmadeusClient {
    pub fn new(config: &AmadeusConfig) -> Result<Self, AmadeusError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;
        let credentials = ClientCredentials::new(
            http.clone(),
            &config.base_url,
            &config.client_id,
            &config.client_secret,
        );
        Ok(Self::with_fetcher(http, &config.base_url, Arc::new(credentials)))
    }

    pub fn with_fetcher(http: reqwest::Client, base_url: &str, fetcher: Arc<dyn TokenFetcher>) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            tokens: TokenCache::new(fetcher),
        }
    }

    /// Authenticated GET returning the decoded JSON body. No retries: errors
    /// go back to the caller, and a 401 drops the cached token so the next
    /// call starts from a fresh one.
    pub async fn get_json(&self, path: &str, params: &[(&str, String)]) -> Result<Value, AmadeusError> {
        let token = self.tokens.access_token().await?;
        debug!("Amadeus GET {} {:?}", path, params);

        let response = self
            .http
            .get(format!("{}{}", self.base_url, path))
            .bearer_auth(token)
            .query(params)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            let err = AmadeusError::from_body(status.as_u16(), &body);
            if err.is_unauthorized() {
                warn!("Amadeus rejected the access token, discarding it");
                self.tokens.invalidate().await;
            }
            return Err(err);
        }

        serde_json::from_str(&body).map_err(|e| AmadeusError::Decode(format!("{}: {}", path, e)))
    }
}

#[async_trait]
impl TravelSupplier for AmadeusClient {
    fn name(&self) -> &str {
        "amadeus"
    }

    async fn search_flights(&self, query: &FlightSearchQuery) -> CoreResult<Value> {
        Ok(self.get_json(FLIGHT_OFFERS_PATH, &query.upstream_params()).await?)
    }

    async fn hotels_by_city(&self, city_code: &str, radius: Option<u32>) -> CoreResult<Value> {
        let mut params = vec![("cityCode", city_code.to_string())];
        if let Some(radius) = radius {
            params.push(("radius", radius.to_string()));
            params.push(("radiusUnit", "KM".to_string()));
        }
        Ok(self.get_json(HOTELS_BY_CITY_PATH, &params).await?)
    }

    async fn hotel_offers(&self, query: &HotelOffersQuery) -> CoreResult<Value> {
        Ok(self.get_json(HOTEL_OFFERS_PATH, &query.upstream_params()).await?)
    }

    async fn search_locations(&self, query: &LocationQuery) -> CoreResult<Value> {
        Ok(self.get_json(LOCATIONS_PATH, &query.upstream_params()).await?)
    }

    async fn flight_inspiration(&self, query: &InspirationQuery) -> CoreResult<Value> {
        Ok(self.get_json(FLIGHT_DESTINATIONS_PATH, &query.upstream_params()).await?)
    }
}
