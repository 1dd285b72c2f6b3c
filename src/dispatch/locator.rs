use serde::Serialize;

use crate::geo::haversine_km;
use crate::models::driver::{Driver, GeoPoint};
use crate::store::drivers::DriverStore;
use crate::store::ledger::LedgerStore;

#[derive(Debug, Clone, Serialize)]
pub struct Candidate {
    pub driver: Driver,
    pub distance_km: f64,
}

/// Online, verified, located drivers within `radius_km` of the pickup,
/// ordered ascending by distance and capped at `limit`. Drivers below
/// `min_points` on the ledger are skipped. Stateless; an empty result is
/// not an error.
pub fn find_eligible(
    drivers: &DriverStore,
    ledger: &LedgerStore,
    pickup: &GeoPoint,
    radius_km: f64,
    limit: usize,
    min_points: i64,
) -> Vec<Candidate> {
    let mut candidates: Vec<Candidate> = drivers
        .list()
        .into_iter()
        .filter_map(|driver| {
            if !driver.is_online || !driver.is_verified {
                return None;
            }
            let location = driver.current_location?;
            if ledger.balance(driver.id) < min_points {
                return None;
            }

            let distance_km = haversine_km(&location, pickup);
            (distance_km <= radius_km).then_some(Candidate {
                driver,
                distance_km,
            })
        })
        .collect();

    candidates.sort_by(|a, b| a.distance_km.total_cmp(&b.distance_km));
    candidates.truncate(limit);
    candidates
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::find_eligible;
    use crate::models::driver::{Driver, GeoPoint};
    use crate::models::ledger::AdjustmentReason;
    use crate::store::drivers::DriverStore;
    use crate::store::ledger::LedgerStore;

    const PICKUP: GeoPoint = GeoPoint {
        lat: 30.0444,
        lng: 31.2357,
    };

    fn add_driver(
        store: &DriverStore,
        lat_offset: f64,
        online: bool,
        verified: bool,
    ) -> Uuid {
        let mut driver = Driver::new(
            "test driver".to_string(),
            "+201000000000".to_string(),
            Some(GeoPoint {
                lat: PICKUP.lat + lat_offset,
                lng: PICKUP.lng,
            }),
        );
        driver.is_online = online;
        driver.is_verified = verified;
        let id = driver.id;
        store.insert(driver);
        id
    }

    #[test]
    fn offline_and_unverified_drivers_are_never_returned() {
        let drivers = DriverStore::new();
        let ledger = LedgerStore::new();
        add_driver(&drivers, 0.001, false, true);
        add_driver(&drivers, 0.001, true, false);

        let found = find_eligible(&drivers, &ledger, &PICKUP, 5.0, 10, 0);
        assert!(found.is_empty());
    }

    #[test]
    fn drivers_outside_radius_are_excluded() {
        let drivers = DriverStore::new();
        let ledger = LedgerStore::new();
        // ~0.09 degrees of latitude is ~10 km
        add_driver(&drivers, 0.09, true, true);

        let found = find_eligible(&drivers, &ledger, &PICKUP, 5.0, 10, 0);
        assert!(found.is_empty());
    }

    #[test]
    fn candidates_are_sorted_by_distance_ascending() {
        let drivers = DriverStore::new();
        let ledger = LedgerStore::new();
        // ~4 km and ~2 km away respectively
        let far = add_driver(&drivers, 0.036, true, true);
        let near = add_driver(&drivers, 0.018, true, true);

        let found = find_eligible(&drivers, &ledger, &PICKUP, 5.0, 10, 0);

        assert_eq!(found.len(), 2);
        assert_eq!(found[0].driver.id, near);
        assert_eq!(found[1].driver.id, far);
        assert!(found[0].distance_km < found[1].distance_km);
    }

    #[test]
    fn limit_caps_the_result() {
        let drivers = DriverStore::new();
        let ledger = LedgerStore::new();
        for i in 1..=5 {
            add_driver(&drivers, 0.002 * i as f64, true, true);
        }

        let found = find_eligible(&drivers, &ledger, &PICKUP, 5.0, 2, 0);
        assert_eq!(found.len(), 2);
    }

    #[test]
    fn drivers_without_a_location_are_skipped() {
        let drivers = DriverStore::new();
        let ledger = LedgerStore::new();
        let mut driver = Driver::new("nowhere".to_string(), "+201".to_string(), None);
        driver.is_online = true;
        driver.is_verified = true;
        drivers.insert(driver);

        let found = find_eligible(&drivers, &ledger, &PICKUP, 5.0, 10, 0);
        assert!(found.is_empty());
    }

    #[test]
    fn min_points_threshold_filters_broke_drivers() {
        let drivers = DriverStore::new();
        let ledger = LedgerStore::new();
        let funded = add_driver(&drivers, 0.002, true, true);
        add_driver(&drivers, 0.001, true, true);

        ledger
            .adjust(
                funded,
                5,
                AdjustmentReason::AdminAdjustment {
                    note: "seed".to_string(),
                },
            )
            .unwrap();

        let found = find_eligible(&drivers, &ledger, &PICKUP, 5.0, 10, 1);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].driver.id, funded);
    }
}
