use axum::{
    extract::{FromRequestParts, Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use wayfare_core::identity::Role;

use crate::error::AppError;
use crate::state::{AppState, AuthConfig};

// ============================================================================
// JWT Claims
// ============================================================================

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub role: Role,
    pub exp: usize,
}

impl Claims {
    pub fn new(auth: &AuthConfig, sub: String, email: Option<String>, role: Role) -> Self {
        let exp = chrono::Utc::now() + chrono::Duration::seconds(auth.expiration as i64);
        Self {
            sub,
            email,
            role,
            exp: exp.timestamp() as usize,
        }
    }

    pub fn encode(&self, auth: &AuthConfig) -> Result<String, AppError> {
        encode(&Header::default(), self, &EncodingKey::from_secret(auth.secret.as_bytes()))
            .map_err(|e| AppError::InternalServerError(format!("Token encoding failed: {}", e)))
    }

    pub fn decode(token: &str, auth: &AuthConfig) -> Result<Self, AppError> {
        decode::<Claims>(
            token,
            &DecodingKey::from_secret(auth.secret.as_bytes()),
            &Validation::default(),
        )
        .map(|data| data.claims)
        .map_err(|_| AppError::AuthenticationError("Invalid or expired token".to_string()))
    }
}

// ============================================================================
// Bearer Authentication Middleware
// ============================================================================

/// Accepts guest and traveler tokens alike; handlers that need an account
/// check the role themselves.
pub async fn require_auth(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let (mut parts, body) = req.into_parts();

    // 1. Extract the bearer token
    let TypedHeader(Authorization(bearer)) =
        TypedHeader::<Authorization<Bearer>>::from_request_parts(&mut parts, &state)
            .await
            .map_err(|_| AppError::AuthenticationError("Missing bearer token".to_string()))?;

    // 2. Decode and validate JWT
    let claims = Claims::decode(bearer.token(), &state.auth)?;

    // 3. Inject claims into request extensions
    parts.extensions.insert(claims);

    Ok(next.run(Request::from_parts(parts, body)).await)
}
