use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::routing::{get, patch, post};
use axum::Json;
use axum::Router;
use serde::Deserialize;
use uuid::Uuid;

use crate::api::rest::require_admin;
use crate::dispatch::locator::{find_eligible, Candidate};
use crate::error::AppError;
use crate::models::auth::AuthUser;
use crate::models::driver::{Driver, GeoPoint};
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/drivers", post(register_driver).get(list_drivers))
        .route("/drivers/nearby", get(nearby_drivers))
        .route("/drivers/:id", get(get_driver))
        .route("/drivers/:id/status", patch(update_status))
        .route("/drivers/:id/location", patch(update_location))
        .route("/drivers/:id/verify", post(verify_driver))
}

#[derive(Deserialize)]
pub struct RegisterDriverRequest {
    pub name: String,
    pub phone: String,
    pub location: Option<GeoPoint>,
}

#[derive(Deserialize)]
pub struct UpdateStatusRequest {
    pub is_online: bool,
}

#[derive(Deserialize)]
pub struct UpdateLocationRequest {
    pub location: GeoPoint,
}

#[derive(Deserialize)]
pub struct NearbyQuery {
    pub lat: f64,
    pub lng: f64,
    pub radius_km: Option<f64>,
    pub limit: Option<usize>,
}

async fn register_driver(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<RegisterDriverRequest>,
) -> Result<Json<Driver>, AppError> {
    if payload.name.trim().is_empty() {
        return Err(AppError::Validation("name cannot be empty".to_string()));
    }
    if payload.phone.trim().is_empty() {
        return Err(AppError::Validation("phone cannot be empty".to_string()));
    }
    if let Some(location) = &payload.location {
        if !location.is_valid() {
            return Err(AppError::Validation(
                "location coordinates are out of range".to_string(),
            ));
        }
    }

    let driver = Driver::new(payload.name, payload.phone, payload.location);
    state.drivers.insert(driver.clone());

    Ok(Json(driver))
}

async fn list_drivers(State(state): State<Arc<AppState>>) -> Json<Vec<Driver>> {
    Json(state.drivers.list())
}

async fn get_driver(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Driver>, AppError> {
    let driver = state
        .drivers
        .get(id)
        .ok_or_else(|| AppError::NotFound(format!("driver {id} not found")))?;

    Ok(Json(driver))
}

async fn update_status(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateStatusRequest>,
) -> Result<Json<Driver>, AppError> {
    let driver = state.drivers.set_online(id, payload.is_online)?;
    Ok(Json(driver))
}

async fn update_location(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateLocationRequest>,
) -> Result<Json<Driver>, AppError> {
    if !payload.location.is_valid() {
        return Err(AppError::Validation(
            "location coordinates are out of range".to_string(),
        ));
    }

    let driver = state.drivers.update_location(id, payload.location)?;
    Ok(Json(driver))
}

async fn verify_driver(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    auth: AuthUser,
) -> Result<Json<Driver>, AppError> {
    require_admin(&auth)?;

    let driver = state.drivers.verify(id)?;
    tracing::info!(driver_id = %id, admin_id = %auth.id, "driver verified");
    Ok(Json(driver))
}

async fn nearby_drivers(
    State(state): State<Arc<AppState>>,
    Query(query): Query<NearbyQuery>,
) -> Result<Json<Vec<Candidate>>, AppError> {
    let pickup = GeoPoint {
        lat: query.lat,
        lng: query.lng,
    };
    if !pickup.is_valid() {
        return Err(AppError::Validation(
            "coordinates are out of range".to_string(),
        ));
    }

    let candidates = find_eligible(
        &state.drivers,
        &state.ledger,
        &pickup,
        query.radius_km.unwrap_or(state.policy.search_radius_km),
        query.limit.unwrap_or(state.policy.candidate_limit),
        state.policy.min_driver_points,
    );

    Ok(Json(candidates))
}
