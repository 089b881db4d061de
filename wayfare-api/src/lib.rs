use axum::{
    extract::State,
    http::{header, Method, StatusCode},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde_json::json;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub mod ai;
pub mod auth;
pub mod destinations;
pub mod error;
pub mod flights;
pub mod hotels;
pub mod metrics;
pub mod middleware;
pub mod proxy;
pub mod state;
pub mod trips;

pub use state::AppState;

pub fn app(state: AppState) -> Router {
    // CORS Middleware
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::USER_AGENT])
        .expose_headers([header::HeaderName::from_static(proxy::CACHE_HEADER)]);

    Router::new()
        .route("/api/health", get(health))
        .route("/metrics", get(metrics_handler))
        .nest("/api/flights", flights::routes())
        .nest("/api/hotels", hotels::routes())
        .nest("/api/destinations", destinations::routes())
        .nest("/api/ai", ai::routes())
        .nest("/api/trips", trips::routes(state.clone()))
        .nest("/api/auth", auth::routes(state.clone()))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::circuit_breaker_middleware,
        ))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::rate_limit_middleware,
        ))
        .with_state(state)
}

/// GET /api/health
async fn health(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "cache": state.cache.backend(),
        "assistant": state.assistant.provider(),
    }))
}

/// GET /metrics
async fn metrics_handler(State(state): State<AppState>) -> impl IntoResponse {
    match state.metrics.render() {
        Ok(body) => (StatusCode::OK, body).into_response(),
        Err(e) => {
            tracing::error!("Failed to render metrics: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
