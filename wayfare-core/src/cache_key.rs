//! Request signatures for the response cache.
//!
//! A signature is `"<prefix>:<sha256 hex>"` where the hash covers the
//! canonical JSON form of the request parameters: object members sorted by
//! key at every depth and `null` members removed. Two parameter objects that
//! differ only in member order or in absent-versus-null fields share a key.

use std::time::Duration;

use chrono::NaiveDate;
use serde::Serialize;
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

use crate::{CoreError, CoreResult};

pub fn canonicalize(value: &Value) -> Value {
    match value {
        Value::Object(members) => {
            let mut keys: Vec<&String> = members
                .iter()
                .filter(|(_, v)| !v.is_null())
                .map(|(k, _)| k)
                .collect();
            keys.sort();

            let mut sorted = Map::new();
            for key in keys {
                sorted.insert(key.clone(), canonicalize(&members[key]));
            }
            Value::Object(sorted)
        }
        Value::Array(items) => Value::Array(items.iter().map(canonicalize).collect()),
        other => other.clone(),
    }
}

pub fn cache_key<T: Serialize + ?Sized>(prefix: &str, params: &T) -> CoreResult<String> {
    let value = serde_json::to_value(params)
        .map_err(|e| CoreError::InternalError(format!("cache key serialization: {}", e)))?;
    let canonical = serde_json::to_string(&canonicalize(&value))
        .map_err(|e| CoreError::InternalError(format!("cache key serialization: {}", e)))?;

    let mut hasher = Sha256::new();
    hasher.update(canonical.as_bytes());
    Ok(format!("{}:{:x}", prefix, hasher.finalize()))
}

// ============================================================================
// Hotel offer freshness
// ============================================================================

pub const HOTEL_TTL_NEAR: Duration = Duration::from_secs(2 * 60);
pub const HOTEL_TTL_SOON: Duration = Duration::from_secs(5 * 60);
pub const HOTEL_TTL_FAR: Duration = Duration::from_secs(15 * 60);

pub const NEAR_WINDOW_DAYS: i64 = 3;
pub const SOON_WINDOW_DAYS: i64 = 14;

/// Hotel availability churns faster the closer the stay is, so offers for
/// imminent check-ins are kept for less time.
pub fn hotel_offers_ttl(check_in: NaiveDate, today: NaiveDate) -> Duration {
    let days_out = (check_in - today).num_days();
    if days_out <= NEAR_WINDOW_DAYS {
        HOTEL_TTL_NEAR
    } else if days_out <= SOON_WINDOW_DAYS {
        HOTEL_TTL_SOON
    } else {
        HOTEL_TTL_FAR
    }
}
