use std::future::Future;
use std::time::Duration;

use axum::{
    http::HeaderValue,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::Value;
use wayfare_core::cache_key::cache_key;

use crate::error::AppError;
use crate::state::AppState;

pub const CACHE_HEADER: &str = "x-cache";

/// A JSON payload together with whether it came out of the response cache.
#[derive(Debug)]
pub struct Cached {
    pub value: Value,
    pub hit: bool,
}

impl IntoResponse for Cached {
    fn into_response(self) -> Response {
        let mut response = Json(self.value).into_response();
        let marker = if self.hit { "HIT" } else { "MISS" };
        response
            .headers_mut()
            .insert(CACHE_HEADER, HeaderValue::from_static(marker));
        response
    }
}

/// Cache-through lookup: the response cache is consulted under
/// `prefix:sha256(params)` and `fetch` only runs on a miss. Failed fetches
/// are never cached. The fetch outcome is counted as one upstream call to
/// `operation`.
pub async fn cached<P, F, Fut>(
    state: &AppState,
    prefix: &str,
    params: &P,
    ttl: Duration,
    operation: &str,
    fetch: F,
) -> Result<Cached, AppError>
where
    P: Serialize + ?Sized,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<Value, AppError>>,
{
    cache_through(state, prefix, params, ttl, || async move {
        let result = fetch().await;
        state.metrics.record_upstream(operation, result.is_ok());
        result
    })
    .await
}

/// Like [`cached`], but leaves upstream metrics to `fetch`, for fetches
/// that make more than one upstream call.
pub async fn cache_through<P, F, Fut>(
    state: &AppState,
    prefix: &str,
    params: &P,
    ttl: Duration,
    fetch: F,
) -> Result<Cached, AppError>
where
    P: Serialize + ?Sized,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<Value, AppError>>,
{
    let key = cache_key(prefix, params)?;

    if let Some(value) = state.cache.get::<Value>(&key).await {
        tracing::debug!("Cache hit for {}", key);
        state.metrics.record_cache(prefix, true);
        return Ok(Cached { value, hit: true });
    }
    state.metrics.record_cache(prefix, false);

    let value = fetch().await?;

    state.cache.set(&key, &value, ttl).await;
    Ok(Cached { value, hit: false })
}
