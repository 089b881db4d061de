use axum::{
    extract::{Extension, Json, Path, State},
    http::StatusCode,
    middleware,
    routing::get,
    Router,
};
use axum_extra::extract::WithRejection;
use uuid::Uuid;
use wayfare_core::trip::{Trip, TripDraft};

use crate::error::AppError;
use crate::middleware::{require_auth, Claims};
use crate::state::AppState;

pub fn routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/", get(list_trips).post(create_trip))
        .route("/{id}", get(get_trip).put(update_trip).delete(delete_trip))
        .route_layer(middleware::from_fn_with_state(state, require_auth))
}

/// Loads a trip owned by the caller. Trips of other users are reported as
/// missing so their ids cannot be probed.
async fn owned_trip(state: &AppState, claims: &Claims, id: Uuid) -> Result<Trip, AppError> {
    match state.trips.get_trip(id).await? {
        Some(trip) if trip.owner_id == claims.sub => Ok(trip),
        _ => Err(AppError::NotFoundError(format!("Trip {} not found", id))),
    }
}

/// GET /api/trips
async fn list_trips(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Vec<Trip>>, AppError> {
    Ok(Json(state.trips.list_trips(&claims.sub).await?))
}

/// POST /api/trips
async fn create_trip(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    WithRejection(Json(draft), _): WithRejection<Json<TripDraft>, AppError>,
) -> Result<(StatusCode, Json<Trip>), AppError> {
    let trip = Trip::create(&claims.sub, draft.validate()?);
    state.trips.create_trip(&trip).await?;
    tracing::info!("Trip {} created for {}", trip.id, claims.sub);
    Ok((StatusCode::CREATED, Json(trip)))
}

/// GET /api/trips/{id}
async fn get_trip(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    WithRejection(Path(id), _): WithRejection<Path<Uuid>, AppError>,
) -> Result<Json<Trip>, AppError> {
    Ok(Json(owned_trip(&state, &claims, id).await?))
}

/// PUT /api/trips/{id}
async fn update_trip(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    WithRejection(Path(id), _): WithRejection<Path<Uuid>, AppError>,
    WithRejection(Json(draft), _): WithRejection<Json<TripDraft>, AppError>,
) -> Result<Json<Trip>, AppError> {
    let draft = draft.validate()?;
    let mut trip = owned_trip(&state, &claims, id).await?;
    trip.apply(draft);
    state.trips.update_trip(&trip).await?;
    Ok(Json(trip))
}

/// DELETE /api/trips/{id}
async fn delete_trip(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    WithRejection(Path(id), _): WithRejection<Path<Uuid>, AppError>,
) -> Result<StatusCode, AppError> {
    owned_trip(&state, &claims, id).await?;
    if !state.trips.delete_trip(id).await? {
        return Err(AppError::NotFoundError(format!("Trip {} not found", id)));
    }
    tracing::info!("Trip {} deleted by {}", id, claims.sub);
    Ok(StatusCode::NO_CONTENT)
}
