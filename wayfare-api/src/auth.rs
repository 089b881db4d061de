use argon2::{
    password_hash::{rand_core::OsRng, SaltString},
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
};
use axum::{
    extract::{Extension, Json, State},
    http::StatusCode,
    middleware,
    routing::{get, post},
    Router,
};
use axum_extra::extract::WithRejection;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use wayfare_core::identity::{check_password_strength, normalize_email, Role, User, UserAccount};

use crate::error::AppError;
use crate::middleware::{require_auth, Claims};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
struct AuthResponse {
    token: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    user: Option<User>,
}

#[derive(Debug, Serialize)]
struct MeResponse {
    user: User,
}

pub fn routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/guest", post(login_guest))
        .merge(
            Router::new()
                .route("/me", get(me))
                .route_layer(middleware::from_fn_with_state(state, require_auth)),
        )
}

// ============================================================================
// Password hashing
// ============================================================================

// Argon2 is CPU bound; hashing runs on the blocking pool.

async fn hash_password(password: String) -> Result<String, AppError> {
    tokio::task::spawn_blocking(move || {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| AppError::InternalServerError(format!("Password hashing failed: {}", e)))
    })
    .await
    .map_err(|e| AppError::InternalServerError(format!("Hashing task failed: {}", e)))?
}

async fn verify_password(password: String, hash: String) -> Result<bool, AppError> {
    tokio::task::spawn_blocking(move || {
        let parsed = PasswordHash::new(&hash)
            .map_err(|e| AppError::InternalServerError(format!("Stored hash is invalid: {}", e)))?;
        Ok::<_, AppError>(
            Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok(),
        )
    })
    .await
    .map_err(|e| AppError::InternalServerError(format!("Hashing task failed: {}", e)))?
}

fn issue_token(state: &AppState, user: &User) -> Result<String, AppError> {
    Claims::new(
        &state.auth,
        user.id.to_string(),
        Some(user.email.clone()),
        Role::Traveler,
    )
    .encode(&state.auth)
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /api/auth/register
async fn register(
    State(state): State<AppState>,
    WithRejection(Json(req), _): WithRejection<Json<RegisterRequest>, AppError>,
) -> Result<(StatusCode, Json<AuthResponse>), AppError> {
    // 1. Validate input before paying for a hash
    let email = normalize_email(&req.email)?;
    check_password_strength(&req.password)?;
    if state.users.find_by_email(&email).await?.is_some() {
        return Err(AppError::ConflictError(format!("{} is already registered", email)));
    }

    // 2. Store the account; the repository still rejects a concurrent duplicate
    let hash = hash_password(req.password).await?;
    let account = UserAccount::new(&email, req.name, hash)?;
    state.users.create_user(&account).await?;
    tracing::info!("Registered user {}", account.user.id);

    // 3. Sign in straight away
    let token = issue_token(&state, &account.user)?;
    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            token,
            user: Some(account.user),
        }),
    ))
}

/// POST /api/auth/login
async fn login(
    State(state): State<AppState>,
    WithRejection(Json(req), _): WithRejection<Json<LoginRequest>, AppError>,
) -> Result<Json<AuthResponse>, AppError> {
    let invalid = || AppError::AuthenticationError("Invalid email or password".to_string());

    let email = normalize_email(&req.email).map_err(|_| invalid())?;
    let account = state.users.find_by_email(&email).await?.ok_or_else(invalid)?;
    if !verify_password(req.password, account.password_hash).await? {
        tracing::warn!("Failed login for {}", account.user.id);
        return Err(invalid());
    }

    let token = issue_token(&state, &account.user)?;
    Ok(Json(AuthResponse {
        token,
        user: Some(account.user),
    }))
}

/// POST /api/auth/guest
async fn login_guest(State(state): State<AppState>) -> Result<Json<AuthResponse>, AppError> {
    let claims = Claims::new(
        &state.auth,
        format!("guest-{}", Uuid::new_v4()),
        None,
        Role::Guest,
    );
    let token = claims.encode(&state.auth)?;
    Ok(Json(AuthResponse { token, user: None }))
}

/// GET /api/auth/me
async fn me(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<MeResponse>, AppError> {
    if claims.role != Role::Traveler {
        return Err(AppError::AuthorizationError("Guests have no account".to_string()));
    }
    let id = Uuid::parse_str(&claims.sub)
        .map_err(|_| AppError::AuthenticationError("Invalid token subject".to_string()))?;
    let user = state
        .users
        .get_user(id)
        .await?
        .ok_or_else(|| AppError::NotFoundError("User not found".to_string()))?;
    Ok(Json(MeResponse { user }))
}
