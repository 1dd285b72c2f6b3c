use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::driver::GeoPoint;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Accepted,
    PickedUp,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled)
    }

    /// Legal forward transitions once a driver holds the order:
    /// accepted -> picked_up -> delivered. Leaving pending only happens
    /// through a claim, which assigns the driver in the same atomic step.
    /// Cancellation is handled separately because it carries a reason and
    /// is reachable from any non-terminal state.
    pub fn can_advance_to(self, next: OrderStatus) -> bool {
        matches!(
            (self, next),
            (OrderStatus::Accepted, OrderStatus::PickedUp)
                | (OrderStatus::PickedUp, OrderStatus::Delivered)
        )
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Accepted => "accepted",
            OrderStatus::PickedUp => "picked_up",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusChange {
    pub status: OrderStatus,
    pub at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Place {
    pub location: GeoPoint,
    pub address: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: Uuid,
    pub user_id: Uuid,
    pub driver_id: Option<Uuid>,
    pub status: OrderStatus,
    pub pickup: Place,
    pub dropoff: Place,
    pub cost: Decimal,
    pub created_at: DateTime<Utc>,
    pub status_history: Vec<StatusChange>,
    pub cancel_reason: Option<String>,
}

impl Order {
    pub fn new(user_id: Uuid, pickup: Place, dropoff: Place, cost: Decimal) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id,
            driver_id: None,
            status: OrderStatus::Pending,
            pickup,
            dropoff,
            cost,
            created_at: now,
            status_history: vec![StatusChange {
                status: OrderStatus::Pending,
                at: now,
            }],
            cancel_reason: None,
        }
    }

    pub fn record(&mut self, status: OrderStatus) {
        self.status = status;
        self.status_history.push(StatusChange {
            status,
            at: Utc::now(),
        });
    }
}

/// Status-change notification consumed by the real-time collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderEvent {
    pub order_id: Uuid,
    pub user_id: Uuid,
    pub driver_id: Option<Uuid>,
    pub old_status: OrderStatus,
    pub new_status: OrderStatus,
    pub at: DateTime<Utc>,
}

impl OrderEvent {
    pub fn transition(order: &Order, old_status: OrderStatus) -> Self {
        Self {
            order_id: order.id,
            user_id: order.user_id,
            driver_id: order.driver_id,
            old_status,
            new_status: order.status,
            at: Utc::now(),
        }
    }
}
