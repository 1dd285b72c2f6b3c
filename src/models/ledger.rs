use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Why a balance changed. Every mutation is attributable to an order or an
/// admin adjustment.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AdjustmentReason {
    OrderReward { order_id: Uuid },
    AdminAdjustment { note: String },
}

/// Immutable audit record of one applied balance change.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub driver_id: Uuid,
    pub delta: i64,
    pub resulting_balance: i64,
    pub reason: AdjustmentReason,
    pub timestamp: DateTime<Utc>,
}
