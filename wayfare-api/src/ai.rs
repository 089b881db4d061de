use axum::{
    extract::{Json, State},
    routing::post,
    Router,
};
use axum_extra::extract::WithRejection;
use serde::{Deserialize, Serialize};
use serde_json::json;
use wayfare_core::assistant::{
    sanitize_conversation, ChatMessage, Recommendation, RecommendationRequest, TripContext,
};

use crate::error::AppError;
use crate::proxy::{cached, Cached};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/chat", post(chat))
        .route("/recommendations", post(recommendations))
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub messages: Vec<ChatMessage>,
    #[serde(default)]
    pub trip: Option<TripContext>,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub reply: String,
    pub provider: String,
}

#[derive(Debug, Serialize)]
pub struct RecommendationsResponse {
    pub recommendations: Vec<Recommendation>,
    pub provider: String,
}

/// POST /api/ai/chat
async fn chat(
    State(state): State<AppState>,
    WithRejection(Json(req), _): WithRejection<Json<ChatRequest>, AppError>,
) -> Result<Json<ChatResponse>, AppError> {
    let messages = sanitize_conversation(req.messages)?;

    let result = state.assistant.chat(&messages, req.trip.as_ref()).await;
    state.metrics.record_upstream("assistant_chat", result.is_ok());

    Ok(Json(ChatResponse {
        reply: result?,
        provider: state.assistant.provider().to_string(),
    }))
}

/// POST /api/ai/recommendations
async fn recommendations(
    State(state): State<AppState>,
    WithRejection(Json(req), _): WithRejection<Json<RecommendationRequest>, AppError>,
) -> Result<Cached, AppError> {
    let request = req.normalized()?;
    let provider = state.assistant.provider().to_string();

    // Answers differ per provider, so the provider is part of the key
    let params = json!({ "provider": provider, "request": request });
    let ttl = state.cache_ttls.recommendations_ttl();
    cached(&state, "recommendations", &params, ttl, "assistant_recommend", || async {
        let recommendations = state.assistant.recommend(&request).await?;
        let body = RecommendationsResponse {
            recommendations,
            provider: provider.clone(),
        };
        Ok::<_, AppError>(json!(body))
    })
    .await
}
