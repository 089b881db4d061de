use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::iata::{normalize_code, normalize_currency, normalize_hotel_id};
use crate::{CoreError, CoreResult};

pub const MAX_ADULTS: u32 = 9;
pub const MAX_FLIGHT_RESULTS: u32 = 250;
pub const MAX_HOTELS_PER_SEARCH: usize = 50;

fn default_adults() -> u32 {
    1
}

fn default_max() -> u32 {
    20
}

fn check_adults(adults: u32) -> CoreResult<()> {
    if adults == 0 || adults > MAX_ADULTS {
        return Err(CoreError::validation(format!(
            "adults must be between 1 and {}",
            MAX_ADULTS
        )));
    }
    Ok(())
}

fn check_stay(check_in: NaiveDate, check_out: NaiveDate, today: NaiveDate) -> CoreResult<()> {
    if check_in < today {
        return Err(CoreError::validation("checkInDate is in the past"));
    }
    if check_out <= check_in {
        return Err(CoreError::validation("checkOutDate must be after checkInDate"));
    }
    Ok(())
}

// ============================================================================
// Flights
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TravelClass {
    Economy,
    PremiumEconomy,
    Business,
    First,
}

impl TravelClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            TravelClass::Economy => "ECONOMY",
            TravelClass::PremiumEconomy => "PREMIUM_ECONOMY",
            TravelClass::Business => "BUSINESS",
            TravelClass::First => "FIRST",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlightSearchQuery {
    pub origin: String,
    pub destination: String,
    pub departure_date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub return_date: Option<NaiveDate>,
    #[serde(default = "default_adults")]
    pub adults: u32,
    #[serde(default = "default_max")]
    pub max: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub non_stop: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub travel_class: Option<TravelClass>,
}

impl FlightSearchQuery {
    /// Validates against `today` and returns the normalized query used both
    /// upstream and for the cache key.
    pub fn normalized(mut self, today: NaiveDate) -> CoreResult<Self> {
        self.origin = normalize_code("origin", &self.origin)?;
        self.destination = normalize_code("destination", &self.destination)?;
        if self.origin == self.destination {
            return Err(CoreError::validation("origin and destination must differ"));
        }
        if self.departure_date < today {
            return Err(CoreError::validation("departureDate is in the past"));
        }
        if let Some(ret) = self.return_date {
            if ret < self.departure_date {
                return Err(CoreError::validation("returnDate is before departureDate"));
            }
        }
        check_adults(self.adults)?;
        if self.max == 0 || self.max > MAX_FLIGHT_RESULTS {
            return Err(CoreError::validation(format!(
                "max must be between 1 and {}",
                MAX_FLIGHT_RESULTS
            )));
        }
        self.currency_code = match self.currency_code.as_deref() {
            Some(c) => Some(normalize_currency(c)?),
            None => None,
        };
        Ok(self)
    }

    /// Query parameters in the shape `GET /v2/shopping/flight-offers` expects.
    pub fn upstream_params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("originLocationCode", self.origin.clone()),
            ("destinationLocationCode", self.destination.clone()),
            ("departureDate", self.departure_date.to_string()),
            ("adults", self.adults.to_string()),
            ("max", self.max.to_string()),
        ];
        if let Some(ret) = self.return_date {
            params.push(("returnDate", ret.to_string()));
        }
        if let Some(non_stop) = self.non_stop {
            params.push(("nonStop", non_stop.to_string()));
        }
        if let Some(currency) = &self.currency_code {
            params.push(("currencyCode", currency.clone()));
        }
        if let Some(class) = self.travel_class {
            params.push(("travelClass", class.as_str().to_string()));
        }
        params
    }
}

// ============================================================================
// Hotels
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HotelSearchQuery {
    pub city_code: String,
    pub check_in_date: NaiveDate,
    pub check_out_date: NaiveDate,
    #[serde(default = "default_adults")]
    pub adults: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub radius: Option<u32>,
    #[serde(default = "default_max")]
    pub max: u32,
}

impl HotelSearchQuery {
    pub fn normalized(mut self, today: NaiveDate) -> CoreResult<Self> {
        self.city_code = normalize_code("cityCode", &self.city_code)?;
        check_stay(self.check_in_date, self.check_out_date, today)?;
        check_adults(self.adults)?;
        if self.max == 0 || self.max as usize > MAX_HOTELS_PER_SEARCH {
            return Err(CoreError::validation(format!(
                "max must be between 1 and {}",
                MAX_HOTELS_PER_SEARCH
            )));
        }
        Ok(self)
    }

    /// The offers lookup for a resolved set of hotel ids.
    pub fn offers_for(&self, hotel_ids: Vec<String>) -> HotelOffersQuery {
        HotelOffersQuery {
            hotel_ids,
            check_in_date: self.check_in_date,
            check_out_date: self.check_out_date,
            adults: self.adults,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HotelOffersQuery {
    pub hotel_ids: Vec<String>,
    pub check_in_date: NaiveDate,
    pub check_out_date: NaiveDate,
    pub adults: u32,
}

impl HotelOffersQuery {
    pub fn normalized(mut self, today: NaiveDate) -> CoreResult<Self> {
        if self.hotel_ids.is_empty() {
            return Err(CoreError::validation("at least one hotel id is required"));
        }
        if self.hotel_ids.len() > MAX_HOTELS_PER_SEARCH {
            return Err(CoreError::validation(format!(
                "at most {} hotel ids per request",
                MAX_HOTELS_PER_SEARCH
            )));
        }
        let mut ids = self
            .hotel_ids
            .iter()
            .map(|id| normalize_hotel_id(id))
            .collect::<CoreResult<Vec<_>>>()?;
        // Order does not change the upstream answer, so it must not change the cache key.
        ids.sort();
        ids.dedup();
        self.hotel_ids = ids;
        check_stay(self.check_in_date, self.check_out_date, today)?;
        check_adults(self.adults)?;
        Ok(self)
    }

    pub fn upstream_params(&self) -> Vec<(&'static str, String)> {
        vec![
            ("hotelIds", self.hotel_ids.join(",")),
            ("checkInDate", self.check_in_date.to_string()),
            ("checkOutDate", self.check_out_date.to_string()),
            ("adults", self.adults.to_string()),
        ]
    }
}

/// Pulls hotel ids out of a `by-city` listing, keeping upstream order.
/// Entries whose id is malformed are skipped.
pub fn hotel_ids_from_listing(listing: &serde_json::Value, limit: usize) -> Vec<String> {
    listing["data"]
        .as_array()
        .map(|hotels| {
            hotels
                .iter()
                .filter_map(|h| h["hotelId"].as_str())
                .filter_map(|id| normalize_hotel_id(id).ok())
                .take(limit)
                .collect()
        })
        .unwrap_or_default()
}

// ============================================================================
// Locations
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LocationSubType {
    Airport,
    City,
}

impl LocationSubType {
    pub fn as_str(&self) -> &'static str {
        match self {
            LocationSubType::Airport => "AIRPORT",
            LocationSubType::City => "CITY",
        }
    }

    /// Parses a comma separated list such as `AIRPORT,CITY`.
    pub fn parse_list(raw: &str) -> CoreResult<Vec<LocationSubType>> {
        let mut types = Vec::new();
        for part in raw.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let sub_type = match part.to_ascii_uppercase().as_str() {
                "AIRPORT" => LocationSubType::Airport,
                "CITY" => LocationSubType::City,
                other => {
                    return Err(CoreError::validation(format!("unknown subType '{}'", other)))
                }
            };
            if !types.contains(&sub_type) {
                types.push(sub_type);
            }
        }
        if types.is_empty() {
            return Err(CoreError::validation("subType must not be empty"));
        }
        types.sort();
        Ok(types)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationQuery {
    pub keyword: String,
    pub sub_types: Vec<LocationSubType>,
}

impl LocationQuery {
    pub fn new(keyword: &str, sub_types: Vec<LocationSubType>) -> CoreResult<Self> {
        let keyword = keyword.trim();
        if keyword.chars().count() < 2 {
            return Err(CoreError::validation("keyword must be at least 2 characters"));
        }
        Ok(Self {
            keyword: keyword.to_uppercase(),
            sub_types,
        })
    }

    pub fn upstream_params(&self) -> Vec<(&'static str, String)> {
        let sub_type = self
            .sub_types
            .iter()
            .map(|t| t.as_str())
            .collect::<Vec<_>>()
            .join(",");
        vec![
            ("keyword", self.keyword.clone()),
            ("subType", sub_type),
            ("view", "LIGHT".to_string()),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InspirationQuery {
    pub origin: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_price: Option<u32>,
}

impl InspirationQuery {
    pub fn normalized(mut self) -> CoreResult<Self> {
        self.origin = normalize_code("origin", &self.origin)?;
        Ok(self)
    }

    pub fn upstream_params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![("origin", self.origin.clone())];
        if let Some(max_price) = self.max_price {
            params.push(("maxPrice", max_price.to_string()));
        }
        params
    }
}
