pub mod drivers;
pub mod ledger;
pub mod orders;
pub mod ws;

use std::sync::Arc;

use axum::extract::{FromRequestParts, State};
use axum::http::request::Parts;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Json;
use axum::Router;
use serde::Serialize;
use tower_http::cors::CorsLayer;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::auth::{AuthUser, Role};
use crate::state::AppState;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .merge(orders::router())
        .merge(drivers::router())
        .merge(ledger::router())
        .route("/health", get(health))
        .route("/metrics", get(metrics))
        .route("/ws", get(ws::ws_handler))
        .with_state(state)
        .layer(CorsLayer::permissive())
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    drivers: usize,
    orders: usize,
    ledger_entries: usize,
}

async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        drivers: state.drivers.len(),
        orders: state.orders.len(),
        ledger_entries: state.ledger.len(),
    })
}

async fn metrics(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match state.metrics.encode() {
        Ok(body) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
            body,
        )
            .into_response(),
        Err(err) => (StatusCode::INTERNAL_SERVER_ERROR, err).into_response(),
    }
}

/// Identity headers set by the authentication collaborator in front of this
/// service. The role is trusted as given.
#[axum::async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header = |name: &str| {
            parts
                .headers
                .get(name)
                .and_then(|value| value.to_str().ok())
                .map(str::to_string)
        };

        let id = header("x-user-id")
            .ok_or_else(|| AppError::Forbidden("missing x-user-id header".to_string()))?;
        let id = Uuid::parse_str(&id)
            .map_err(|_| AppError::Forbidden("invalid x-user-id header".to_string()))?;

        let role = header("x-user-role")
            .ok_or_else(|| AppError::Forbidden("missing x-user-role header".to_string()))?
            .parse::<Role>()
            .map_err(AppError::Forbidden)?;

        Ok(AuthUser {
            id,
            email: header("x-user-email").unwrap_or_default(),
            role,
        })
    }
}

pub(crate) fn require_admin(auth: &AuthUser) -> Result<(), AppError> {
    if auth.role != Role::Admin {
        return Err(AppError::Forbidden(
            "this operation requires the admin role".to_string(),
        ));
    }
    Ok(())
}
