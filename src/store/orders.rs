use dashmap::DashMap;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::order::{Order, OrderStatus};

/// Order records keyed by id. All mutations happen under the map entry
/// guard, which gives the compare-and-set semantics the claim and advance
/// operations rely on.
#[derive(Default)]
pub struct OrderStore {
    orders: DashMap<Uuid, Order>,
}

/// What a cancel actually changed. Both options are `None` when the order
/// was already cancelled and the call was a no-op.
#[derive(Debug)]
pub struct Cancellation {
    pub order: Order,
    pub previous_status: Option<OrderStatus>,
    pub released_driver: Option<Uuid>,
}

impl OrderStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, order: Order) {
        self.orders.insert(order.id, order);
    }

    pub fn get(&self, order_id: Uuid) -> Option<Order> {
        self.orders.get(&order_id).map(|entry| entry.value().clone())
    }

    pub fn len(&self) -> usize {
        self.orders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    pub fn list_for_user(&self, user_id: Uuid) -> Vec<Order> {
        let mut orders: Vec<Order> = self
            .orders
            .iter()
            .filter(|entry| entry.value().user_id == user_id)
            .map(|entry| entry.value().clone())
            .collect();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        orders
    }

    pub fn list_for_driver(&self, driver_id: Uuid) -> Vec<Order> {
        let mut orders: Vec<Order> = self
            .orders
            .iter()
            .filter(|entry| entry.value().driver_id == Some(driver_id))
            .map(|entry| entry.value().clone())
            .collect();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        orders
    }

    /// Atomically assign a driver to a pending order. Exactly one claim can
    /// win; losers see `AlreadyClaimed` and must not overwrite.
    pub fn claim(&self, order_id: Uuid, driver_id: Uuid) -> Result<Order, AppError> {
        let mut order = self
            .orders
            .get_mut(&order_id)
            .ok_or_else(|| AppError::NotFound(format!("order {order_id} not found")))?;

        if order.driver_id.is_some() {
            return Err(AppError::AlreadyClaimed { order_id });
        }
        if order.status != OrderStatus::Pending {
            return Err(AppError::Conflict(format!(
                "order {order_id} is {} and cannot be claimed",
                order.status
            )));
        }

        order.driver_id = Some(driver_id);
        order.record(OrderStatus::Accepted);
        Ok(order.clone())
    }

    /// Optimistic-concurrency status transition: fails with `Conflict` when
    /// the stored status no longer matches `expected`.
    pub fn advance(
        &self,
        order_id: Uuid,
        expected: OrderStatus,
        next: OrderStatus,
    ) -> Result<Order, AppError> {
        if !expected.can_advance_to(next) {
            return Err(AppError::InvalidTransition {
                from: expected,
                to: next,
            });
        }

        let mut order = self
            .orders
            .get_mut(&order_id)
            .ok_or_else(|| AppError::NotFound(format!("order {order_id} not found")))?;

        if order.status != expected {
            return Err(AppError::Conflict(format!(
                "order {order_id} is {}, expected {expected}",
                order.status
            )));
        }

        order.record(next);
        Ok(order.clone())
    }

    /// Cancel from any non-terminal state. Idempotent: cancelling an already
    /// cancelled order is a no-op. A claimed order releases its driver, so
    /// cancelled orders never carry a driver id; the released driver is
    /// reported back for the status-change event.
    pub fn cancel(
        &self,
        order_id: Uuid,
        reason: Option<String>,
    ) -> Result<Cancellation, AppError> {
        let mut order = self
            .orders
            .get_mut(&order_id)
            .ok_or_else(|| AppError::NotFound(format!("order {order_id} not found")))?;

        match order.status {
            OrderStatus::Cancelled => Ok(Cancellation {
                order: order.clone(),
                previous_status: None,
                released_driver: None,
            }),
            OrderStatus::Delivered => Err(AppError::InvalidTransition {
                from: OrderStatus::Delivered,
                to: OrderStatus::Cancelled,
            }),
            previous => {
                let released_driver = order.driver_id.take();
                order.cancel_reason = reason;
                order.record(OrderStatus::Cancelled);
                Ok(Cancellation {
                    order: order.clone(),
                    previous_status: Some(previous),
                    released_driver,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use rust_decimal::Decimal;
    use uuid::Uuid;

    use super::OrderStore;
    use crate::error::AppError;
    use crate::models::driver::GeoPoint;
    use crate::models::order::{Order, OrderStatus, Place};

    fn place(lat: f64, lng: f64) -> Place {
        Place {
            location: GeoPoint { lat, lng },
            address: "test address".to_string(),
        }
    }

    fn pending_order(store: &OrderStore) -> Uuid {
        let order = Order::new(
            Uuid::new_v4(),
            place(30.04, 31.23),
            place(30.06, 31.25),
            Decimal::new(100, 0),
        );
        let id = order.id;
        store.insert(order);
        id
    }

    #[test]
    fn claim_assigns_driver_and_accepts() {
        let store = OrderStore::new();
        let order_id = pending_order(&store);
        let driver_id = Uuid::new_v4();

        let claimed = store.claim(order_id, driver_id).unwrap();

        assert_eq!(claimed.status, OrderStatus::Accepted);
        assert_eq!(claimed.driver_id, Some(driver_id));
        assert_eq!(claimed.status_history.len(), 2);
    }

    #[test]
    fn second_claim_loses() {
        let store = OrderStore::new();
        let order_id = pending_order(&store);
        let winner = Uuid::new_v4();

        store.claim(order_id, winner).unwrap();
        let err = store.claim(order_id, Uuid::new_v4()).unwrap_err();

        assert!(matches!(err, AppError::AlreadyClaimed { .. }));
        assert_eq!(store.get(order_id).unwrap().driver_id, Some(winner));
    }

    #[test]
    fn concurrent_claims_have_exactly_one_winner() {
        let store = Arc::new(OrderStore::new());
        let order_id = pending_order(&store);

        let handles: Vec<_> = (1..=16u128)
            .map(|seed| {
                let store = store.clone();
                let driver_id = Uuid::from_u128(seed);
                std::thread::spawn(move || store.claim(order_id, driver_id).map(|_| driver_id))
            })
            .collect();

        let winners: Vec<Uuid> = handles
            .into_iter()
            .filter_map(|handle| handle.join().unwrap().ok())
            .collect();

        assert_eq!(winners.len(), 1);
        assert_eq!(store.get(order_id).unwrap().driver_id, Some(winners[0]));
    }

    #[test]
    fn claim_on_cancelled_order_is_conflict() {
        let store = OrderStore::new();
        let order_id = pending_order(&store);

        store.cancel(order_id, None).unwrap();
        let err = store.claim(order_id, Uuid::new_v4()).unwrap_err();

        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[test]
    fn advance_rejects_illegal_transition() {
        let store = OrderStore::new();
        let order_id = pending_order(&store);

        let err = store
            .advance(order_id, OrderStatus::Delivered, OrderStatus::Accepted)
            .unwrap_err();

        assert!(matches!(err, AppError::InvalidTransition { .. }));
    }

    #[test]
    fn advance_cannot_take_an_order_out_of_pending() {
        let store = OrderStore::new();
        let order_id = pending_order(&store);

        let err = store
            .advance(order_id, OrderStatus::Pending, OrderStatus::Accepted)
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidTransition { .. }));

        // the order is untouched and still claimable
        let order = store.get(order_id).unwrap();
        assert_eq!(order.status, OrderStatus::Pending);
        assert!(order.driver_id.is_none());
        store.claim(order_id, Uuid::new_v4()).unwrap();
    }

    #[test]
    fn advance_with_stale_expected_is_conflict() {
        let store = OrderStore::new();
        let order_id = pending_order(&store);

        // still pending, so claiming the accepted -> picked_up leg must fail
        let err = store
            .advance(order_id, OrderStatus::Accepted, OrderStatus::PickedUp)
            .unwrap_err();

        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[test]
    fn cancel_is_idempotent() {
        let store = OrderStore::new();
        let order_id = pending_order(&store);

        let first = store
            .cancel(order_id, Some("rider gave up".to_string()))
            .unwrap();
        assert_eq!(first.previous_status, Some(OrderStatus::Pending));

        let second = store.cancel(order_id, None).unwrap();
        assert_eq!(second.previous_status, None);
        assert_eq!(second.released_driver, None);
        assert_eq!(second.order.status, OrderStatus::Cancelled);
        assert_eq!(
            second.order.status_history.len(),
            first.order.status_history.len()
        );
        assert_eq!(second.order.cancel_reason.as_deref(), Some("rider gave up"));
    }

    #[test]
    fn cancel_releases_the_claimed_driver() {
        let store = OrderStore::new();
        let order_id = pending_order(&store);
        let driver_id = Uuid::new_v4();

        store.claim(order_id, driver_id).unwrap();
        let cancellation = store.cancel(order_id, None).unwrap();

        assert_eq!(cancellation.previous_status, Some(OrderStatus::Accepted));
        assert_eq!(cancellation.released_driver, Some(driver_id));
        assert_eq!(cancellation.order.status, OrderStatus::Cancelled);
        assert!(cancellation.order.driver_id.is_none());
    }

    #[test]
    fn cancel_after_delivery_is_rejected() {
        let store = OrderStore::new();
        let order_id = pending_order(&store);

        store.claim(order_id, Uuid::new_v4()).unwrap();
        store
            .advance(order_id, OrderStatus::Accepted, OrderStatus::PickedUp)
            .unwrap();
        store
            .advance(order_id, OrderStatus::PickedUp, OrderStatus::Delivered)
            .unwrap();

        let err = store.cancel(order_id, None).unwrap_err();
        assert!(matches!(err, AppError::InvalidTransition { .. }));
    }
}
