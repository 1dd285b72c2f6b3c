use std::sync::Mutex;

use chrono::Utc;
use dashmap::DashMap;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::ledger::{AdjustmentReason, LedgerEntry};

/// Per-driver point balances plus an append-only audit log. Adjustments run
/// entirely under the balance entry guard, so concurrent callers serialize
/// per driver and the log never disagrees with the balance.
#[derive(Default)]
pub struct LedgerStore {
    balances: DashMap<Uuid, i64>,
    log: Mutex<Vec<LedgerEntry>>,
}

impl LedgerStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current balance; drivers without a record have zero points.
    pub fn balance(&self, driver_id: Uuid) -> i64 {
        self.balances.get(&driver_id).map(|b| *b).unwrap_or(0)
    }

    /// Atomic conditional adjustment. A delta that would drive the balance
    /// below zero fails with `InsufficientPoints` and leaves the balance
    /// untouched.
    pub fn adjust(
        &self,
        driver_id: Uuid,
        delta: i64,
        reason: AdjustmentReason,
    ) -> Result<LedgerEntry, AppError> {
        let mut balance = self.balances.entry(driver_id).or_insert(0);

        let updated = balance.checked_add(delta).ok_or_else(|| {
            AppError::Validation(format!("points delta {delta} overflows the balance"))
        })?;
        if updated < 0 {
            return Err(AppError::InsufficientPoints {
                driver_id,
                balance: *balance,
                delta,
            });
        }

        *balance = updated;
        let entry = LedgerEntry {
            driver_id,
            delta,
            resulting_balance: updated,
            reason,
            timestamp: Utc::now(),
        };

        self.log
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(entry.clone());

        Ok(entry)
    }

    /// Audit trail for one driver, oldest first.
    pub fn entries_for(&self, driver_id: Uuid) -> Vec<LedgerEntry> {
        self.log
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .iter()
            .filter(|entry| entry.driver_id == driver_id)
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.log
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use uuid::Uuid;

    use super::LedgerStore;
    use crate::error::AppError;
    use crate::models::ledger::AdjustmentReason;

    fn admin_note() -> AdjustmentReason {
        AdjustmentReason::AdminAdjustment {
            note: "test".to_string(),
        }
    }

    #[test]
    fn unknown_driver_has_zero_balance() {
        let ledger = LedgerStore::new();
        assert_eq!(ledger.balance(Uuid::new_v4()), 0);
    }

    #[test]
    fn adjustments_accumulate_and_are_logged() {
        let ledger = LedgerStore::new();
        let driver_id = Uuid::new_v4();

        ledger.adjust(driver_id, 10, admin_note()).unwrap();
        let entry = ledger.adjust(driver_id, -4, admin_note()).unwrap();

        assert_eq!(entry.resulting_balance, 6);
        assert_eq!(ledger.balance(driver_id), 6);

        let entries = ledger.entries_for(driver_id);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].delta, 10);
        assert_eq!(entries[1].delta, -4);
    }

    #[test]
    fn overdraw_fails_and_leaves_balance_unchanged() {
        let ledger = LedgerStore::new();
        let driver_id = Uuid::new_v4();

        ledger.adjust(driver_id, 5, admin_note()).unwrap();
        let err = ledger.adjust(driver_id, -10, admin_note()).unwrap_err();

        assert!(matches!(
            err,
            AppError::InsufficientPoints {
                balance: 5,
                delta: -10,
                ..
            }
        ));
        assert_eq!(ledger.balance(driver_id), 5);
        assert_eq!(ledger.entries_for(driver_id).len(), 1);
    }

    #[test]
    fn concurrent_adjustments_serialize_per_driver() {
        let ledger = Arc::new(LedgerStore::new());
        let driver_id = Uuid::new_v4();

        let handles: Vec<_> = (0..16)
            .map(|i| {
                let ledger = ledger.clone();
                // half credits of 5, half debits of 3
                let delta = if i % 2 == 0 { 5 } else { -3 };
                std::thread::spawn(move || ledger.adjust(driver_id, delta, admin_note()))
            })
            .collect();

        let applied: i64 = handles
            .into_iter()
            .filter_map(|handle| handle.join().unwrap().ok())
            .map(|entry| entry.delta)
            .sum();

        assert_eq!(ledger.balance(driver_id), applied);
        assert!(ledger.balance(driver_id) >= 0);
        assert!(ledger
            .entries_for(driver_id)
            .iter()
            .all(|entry| entry.resulting_balance >= 0));
    }
}
