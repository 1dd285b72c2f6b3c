use std::time::Instant;

use tokio::time::timeout;
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::dispatch::locator::find_eligible;
use crate::dispatch::reward::reward_points;
use crate::error::AppError;
use crate::models::ledger::{AdjustmentReason, LedgerEntry};
use crate::models::order::{Order, OrderEvent, OrderStatus};
use crate::state::AppState;

/// Find an eligible driver for a pending order and claim it, first success
/// wins. The order stays pending when no candidate works out; the caller
/// decides whether and when to retry. The whole attempt runs under the
/// policy deadline and fails with a retryable `Timeout` on expiry.
pub async fn dispatch_order(state: &AppState, order_id: Uuid) -> Result<Order, AppError> {
    let start = Instant::now();
    let result = match timeout(state.policy.dispatch_timeout, try_dispatch(state, order_id)).await
    {
        Ok(result) => result,
        Err(_) => Err(AppError::Timeout(format!(
            "dispatch of order {order_id} exceeded the deadline"
        ))),
    };

    let outcome = match &result {
        Ok(_) => "success",
        Err(AppError::NoEligibleDrivers) => "no_drivers",
        Err(_) => "error",
    };
    state
        .metrics
        .dispatch_latency_seconds
        .with_label_values(&[outcome])
        .observe(start.elapsed().as_secs_f64());
    state
        .metrics
        .dispatches_total
        .with_label_values(&[outcome])
        .inc();

    result
}

async fn try_dispatch(state: &AppState, order_id: Uuid) -> Result<Order, AppError> {
    let order = state
        .orders
        .get(order_id)
        .ok_or_else(|| AppError::NotFound(format!("order {order_id} not found")))?;

    if order.status != OrderStatus::Pending {
        return Err(AppError::Conflict(format!(
            "order {order_id} is {} and cannot be dispatched",
            order.status
        )));
    }

    let candidates = find_eligible(
        &state.drivers,
        &state.ledger,
        &order.pickup.location,
        state.policy.search_radius_km,
        state.policy.candidate_limit,
        state.policy.min_driver_points,
    );

    for candidate in candidates {
        // the stores are synchronous, so yield between claim attempts to
        // give the dispatch deadline a chance to fire
        tokio::task::yield_now().await;

        // the snapshot may be stale by claim time
        let still_eligible = state
            .drivers
            .get(candidate.driver.id)
            .map(|driver| driver.is_online && driver.is_verified)
            .unwrap_or(false);
        if !still_eligible {
            debug!(
                order_id = %order_id,
                driver_id = %candidate.driver.id,
                "candidate no longer eligible, trying next"
            );
            continue;
        }

        let claimed = state.orders.claim(order_id, candidate.driver.id)?;
        state.emit(OrderEvent::transition(&claimed, OrderStatus::Pending));
        info!(
            order_id = %order_id,
            driver_id = %candidate.driver.id,
            distance_km = candidate.distance_km,
            "order claimed"
        );
        return Ok(claimed);
    }

    Err(AppError::NoEligibleDrivers)
}

/// Coordinator-level transition for the in-progress leg of an order.
/// Delivery settlement must go through `complete_order` so the points award
/// cannot be skipped.
pub fn advance_order(
    state: &AppState,
    order_id: Uuid,
    expected: OrderStatus,
    next: OrderStatus,
) -> Result<Order, AppError> {
    if next == OrderStatus::Delivered {
        return Err(AppError::Validation(
            "delivery must go through the complete operation".to_string(),
        ));
    }

    let order = state.orders.advance(order_id, expected, next)?;
    state.emit(OrderEvent::transition(&order, expected));
    info!(order_id = %order_id, from = %expected, to = %next, "order advanced");
    Ok(order)
}

/// Mark a picked-up order delivered and award points. The status CAS means
/// at most one completion ever wins, so the reward is applied exactly once.
/// A ledger failure does not roll the status back; it is logged for manual
/// reconciliation.
pub fn complete_order(
    state: &AppState,
    order_id: Uuid,
) -> Result<(Order, Option<LedgerEntry>), AppError> {
    let order = state
        .orders
        .advance(order_id, OrderStatus::PickedUp, OrderStatus::Delivered)?;
    state.emit(OrderEvent::transition(&order, OrderStatus::PickedUp));

    let driver_id = order.driver_id.ok_or_else(|| {
        AppError::Internal(format!("delivered order {order_id} has no driver"))
    })?;

    if let Err(err) = state.drivers.record_trip(driver_id) {
        error!(order_id = %order_id, driver_id = %driver_id, error = %err, "failed to record trip");
    }

    let points = reward_points(order.cost, state.policy.reward_rate);
    let awarded = match state
        .ledger
        .adjust(driver_id, points, AdjustmentReason::OrderReward { order_id })
    {
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
            info!(
                order_id = %order_id,
                driver_id = %driver_id,
                points,
                balance = entry.resulting_balance,
                "reward applied"
            );
            Some(entry)
        }
        Err(err) => {
            state
                .metrics
                .points_adjustments_total
                .with_label_values(&["error"])
                .inc();
            error!(
                order_id = %order_id,
                driver_id = %driver_id,
                points,
                error = %err,
                "reward adjustment failed; order stays delivered, reconcile manually"
            );
            None
        }
    };

    Ok((order, awarded))
}

/// Cancel from any non-terminal state; repeated cancels are no-ops. A
/// claimed order releases its driver, and the event still carries that
/// driver so their clients hear about the cancellation. There is no points
/// hold to release because rewards are only applied on completion.
pub fn cancel_order(
    state: &AppState,
    order_id: Uuid,
    reason: Option<String>,
) -> Result<Order, AppError> {
    let cancellation = state.orders.cancel(order_id, reason)?;

    if let Some(previous) = cancellation.previous_status {
        let mut event = OrderEvent::transition(&cancellation.order, previous);
        event.driver_id = cancellation.released_driver;
        state.emit(event);
        info!(
            order_id = %order_id,
            from = %previous,
            released_driver = ?cancellation.released_driver,
            "order cancelled"
        );
    }

    Ok(cancellation.order)
}
