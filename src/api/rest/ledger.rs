use std::sync::Arc;

use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::Json;
use axum::Router;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::rest::require_admin;
use crate::error::AppError;
use crate::models::auth::AuthUser;
use crate::models::ledger::{AdjustmentReason, LedgerEntry};
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/drivers/:id/points", get(get_balance))
        .route("/drivers/:id/points/history", get(get_history))
        .route("/drivers/:id/points/adjust", post(adjust_points))
}

#[derive(Serialize)]
pub struct BalanceResponse {
    pub driver_id: Uuid,
    pub points: i64,
}

#[derive(Deserialize)]
pub struct AdjustRequest {
    pub delta: i64,
    pub note: String,
}

async fn get_balance(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Json<BalanceResponse> {
    Json(BalanceResponse {
        driver_id: id,
        points: state.ledger.balance(id),
    })
}

async fn get_history(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Json<Vec<LedgerEntry>> {
    Json(state.ledger.entries_for(id))
}

async fn adjust_points(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    auth: AuthUser,
    Json(payload): Json<AdjustRequest>,
) -> Result<Json<LedgerEntry>, AppError> {
    require_admin(&auth)?;

    let result = state.ledger.adjust(
        id,
        payload.delta,
        AdjustmentReason::AdminAdjustment { note: payload.note },
    );

    match &result {
        Ok(entry) => {
            state
                .metrics
                .points_adjustments_total
                .with_label_values(&["success"])
                .inc();
            state
                .metrics
                .points_awarded_total
                .inc_by(entry.delta.max(0) as u64);
            tracing::info!(
                driver_id = %id,
                admin_id = %auth.id,
                delta = payload.delta,
                balance = entry.resulting_balance,
                "points adjusted"
            );
        }
        Err(_) => {
            state
                .metrics
                .points_adjustments_total
                .with_label_values(&["error"])
                .inc();
        }
    }

    result.map(Json)
}
