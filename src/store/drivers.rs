use chrono::Utc;
use dashmap::DashMap;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::driver::{Driver, GeoPoint};

/// Driver profiles keyed by id. Drivers are never hard-deleted.
#[derive(Default)]
pub struct DriverStore {
    drivers: DashMap<Uuid, Driver>,
}

impl DriverStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, driver: Driver) {
        self.drivers.insert(driver.id, driver);
    }

    pub fn get(&self, driver_id: Uuid) -> Option<Driver> {
        self.drivers
            .get(&driver_id)
            .map(|entry| entry.value().clone())
    }

    pub fn list(&self) -> Vec<Driver> {
        self.drivers
            .iter()
            .map(|entry| entry.value().clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.drivers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.drivers.is_empty()
    }

    pub fn set_online(&self, driver_id: Uuid, is_online: bool) -> Result<Driver, AppError> {
        let mut driver = self.get_mut(driver_id)?;
        driver.is_online = is_online;
        Ok(driver.clone())
    }

    pub fn update_location(&self, driver_id: Uuid, location: GeoPoint) -> Result<Driver, AppError> {
        let mut driver = self.get_mut(driver_id)?;
        driver.current_location = Some(location);
        driver.last_location_update = Some(Utc::now());
        Ok(driver.clone())
    }

    /// One-way admin action: an unverified driver is never matchable.
    pub fn verify(&self, driver_id: Uuid) -> Result<Driver, AppError> {
        let mut driver = self.get_mut(driver_id)?;
        driver.is_verified = true;
        Ok(driver.clone())
    }

    pub fn record_trip(&self, driver_id: Uuid) -> Result<Driver, AppError> {
        let mut driver = self.get_mut(driver_id)?;
        driver.total_trips = driver.total_trips.saturating_add(1);
        Ok(driver.clone())
    }

    fn get_mut(
        &self,
        driver_id: Uuid,
    ) -> Result<dashmap::mapref::one::RefMut<'_, Uuid, Driver>, AppError> {
        self.drivers
            .get_mut(&driver_id)
            .ok_or_else(|| AppError::NotFound(format!("driver {driver_id} not found")))
    }
}
