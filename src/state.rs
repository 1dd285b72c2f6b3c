use tokio::sync::broadcast;

use crate::config::Config;
use crate::dispatch::DispatchPolicy;
use crate::models::order::OrderEvent;
use crate::observability::metrics::Metrics;
use crate::store::drivers::DriverStore;
use crate::store::ledger::LedgerStore;
use crate::store::orders::OrderStore;

pub struct AppState {
    pub drivers: DriverStore,
    pub orders: OrderStore,
    pub ledger: LedgerStore,
    pub policy: DispatchPolicy,
    pub order_events_tx: broadcast::Sender<OrderEvent>,
    pub metrics: Metrics,
}

impl AppState {
    pub fn new(config: &Config) -> Self {
        let (order_events_tx, _unused_rx) = broadcast::channel(config.event_buffer_size);

        Self {
            drivers: DriverStore::new(),
            orders: OrderStore::new(),
            ledger: LedgerStore::new(),
            policy: DispatchPolicy::from(config),
            order_events_tx,
            metrics: Metrics::new(),
        }
    }

    /// Best-effort fan-out to the real-time collaborator; an event with no
    /// subscribers is dropped.
    pub fn emit(&self, event: OrderEvent) {
        let _ = self.order_events_tx.send(event);
    }
}
