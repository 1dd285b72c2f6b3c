use std::sync::Arc;

use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::Json;
use axum::Router;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::dispatch::coordinator;
use crate::error::AppError;
use crate::models::ledger::LedgerEntry;
use crate::models::order::{Order, OrderStatus, Place};
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/orders", post(create_order))
        .route("/orders/:id", get(get_order))
        .route("/orders/:id/dispatch", post(dispatch_order))
        .route("/orders/:id/advance", post(advance_order))
        .route("/orders/:id/complete", post(complete_order))
        .route("/orders/:id/cancel", post(cancel_order))
        .route("/users/:id/orders", get(list_user_orders))
        .route("/drivers/:id/orders", get(list_driver_orders))
}

#[derive(Deserialize)]
pub struct CreateOrderRequest {
    pub user_id: Uuid,
    pub pickup: Place,
    pub dropoff: Place,
    pub cost: Decimal,
}

#[derive(Deserialize)]
pub struct AdvanceRequest {
    pub expected: OrderStatus,
    pub next: OrderStatus,
}

#[derive(Deserialize)]
pub struct CancelRequest {
    pub reason: Option<String>,
}

#[derive(Serialize)]
pub struct CompleteResponse {
    pub order: Order,
    pub awarded: Option<LedgerEntry>,
}

async fn create_order(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateOrderRequest>,
) -> Result<Json<Order>, AppError> {
    if payload.cost.is_sign_negative() {
        return Err(AppError::Validation("cost cannot be negative".to_string()));
    }
    if !payload.pickup.location.is_valid() {
        return Err(AppError::Validation(
            "pickup coordinates are out of range".to_string(),
        ));
    }
    if !payload.dropoff.location.is_valid() {
        return Err(AppError::Validation(
            "dropoff coordinates are out of range".to_string(),
        ));
    }

    let order = Order::new(payload.user_id, payload.pickup, payload.dropoff, payload.cost);
    state.orders.insert(order.clone());
    state.metrics.orders_created_total.inc();

    Ok(Json(order))
}

async fn get_order(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Order>, AppError> {
    let order = state
        .orders
        .get(id)
        .ok_or_else(|| AppError::NotFound(format!("order {id} not found")))?;

    Ok(Json(order))
}

async fn dispatch_order(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Order>, AppError> {
    let order = coordinator::dispatch_order(&state, id).await?;
    Ok(Json(order))
}

async fn advance_order(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<AdvanceRequest>,
) -> Result<Json<Order>, AppError> {
    let order = coordinator::advance_order(&state, id, payload.expected, payload.next)?;
    Ok(Json(order))
}

async fn complete_order(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<CompleteResponse>, AppError> {
    let (order, awarded) = coordinator::complete_order(&state, id)?;
    Ok(Json(CompleteResponse { order, awarded }))
}

async fn cancel_order(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<CancelRequest>,
) -> Result<Json<Order>, AppError> {
    let order = coordinator::cancel_order(&state, id, payload.reason)?;
    Ok(Json(order))
}

async fn list_user_orders(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Json<Vec<Order>> {
    Json(state.orders.list_for_user(id))
}

async fn list_driver_orders(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Json<Vec<Order>> {
    Json(state.orders.list_for_driver(id))
}
