use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::iata::normalize_optional_code;
use crate::search::MAX_ADULTS;
use crate::{CoreError, CoreResult};

pub const MAX_TRIP_NAME_LEN: usize = 120;
pub const MAX_INTERESTS: usize = 20;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Trip {
    pub id: Uuid,
    pub owner_id: String,
    pub name: String,
    pub origin: Option<String>,
    pub destination: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub budget: Option<f64>,
    pub adults: u32,
    pub interests: Vec<String>,
    pub selected_flight: Option<serde_json::Value>,
    pub selected_hotel: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Client-supplied trip fields, used for both create and full update.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TripDraft {
    pub name: Option<String>,
    pub origin: Option<String>,
    pub destination: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub budget: Option<f64>,
    pub adults: Option<u32>,
    #[serde(default)]
    pub interests: Vec<String>,
    pub selected_flight: Option<serde_json::Value>,
    pub selected_hotel: Option<serde_json::Value>,
}

impl TripDraft {
    pub fn validate(mut self) -> CoreResult<Self> {
        self.origin = normalize_optional_code("origin", self.origin.as_deref())?;
        self.destination = normalize_optional_code("destination", self.destination.as_deref())?;

        if let (Some(start), Some(end)) = (self.start_date, self.end_date) {
            if end < start {
                return Err(CoreError::validation("endDate is before startDate"));
            }
        }
        if let Some(budget) = self.budget {
            if !budget.is_finite() || budget < 0.0 {
                return Err(CoreError::validation("budget must be a non-negative number"));
            }
        }
        if let Some(adults) = self.adults {
            if adults == 0 || adults > MAX_ADULTS {
                return Err(CoreError::validation(format!(
                    "adults must be between 1 and {}",
                    MAX_ADULTS
                )));
            }
        }
        if let Some(name) = &self.name {
            if name.chars().count() > MAX_TRIP_NAME_LEN {
                return Err(CoreError::validation("trip name is too long"));
            }
        }

        let mut interests: Vec<String> = Vec::new();
        for interest in self.interests.iter().map(|i| i.trim().to_lowercase()) {
            if !interest.is_empty() && !interests.contains(&interest) {
                interests.push(interest);
            }
        }
        if interests.len() > MAX_INTERESTS {
            return Err(CoreError::validation("too many interests"));
        }
        self.interests = interests;
        Ok(self)
    }

    fn display_name(&self) -> String {
        match self.name.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => match &self.destination {
                Some(dest) => format!("Trip to {}", dest),
                None => "Untitled trip".to_string(),
            },
        }
    }
}

impl Trip {
    /// Builds a new trip from an already validated draft.
    pub fn create(owner_id: &str, draft: TripDraft) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            owner_id: owner_id.to_string(),
            name: draft.display_name(),
            origin: draft.origin,
            destination: draft.destination,
            start_date: draft.start_date,
            end_date: draft.end_date,
            budget: draft.budget,
            adults: draft.adults.unwrap_or(1),
            interests: draft.interests,
            selected_flight: draft.selected_flight,
            selected_hotel: draft.selected_hotel,
            created_at: now,
            updated_at: now,
        }
    }

    /// Replaces the editable fields with an already validated draft.
    pub fn apply(&mut self, draft: TripDraft) {
        self.name = draft.display_name();
        self.origin = draft.origin;
        self.destination = draft.destination;
        self.start_date = draft.start_date;
        self.end_date = draft.end_date;
        self.budget = draft.budget;
        self.adults = draft.adults.unwrap_or(1);
        self.interests = draft.interests;
        self.selected_flight = draft.selected_flight;
        self.selected_hotel = draft.selected_hotel;
        self.updated_at = Utc::now();
    }

    pub fn nights(&self) -> Option<i64> {
        match (self.start_date, self.end_date) {
            (Some(start), Some(end)) => Some((end - start).num_days()),
            _ => None,
        }
    }
}
