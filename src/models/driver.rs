use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lng)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Driver {
    pub id: Uuid,
    pub name: String,
    pub phone: String,
    pub is_online: bool,
    pub is_verified: bool,
    pub current_location: Option<GeoPoint>,
    pub last_location_update: Option<DateTime<Utc>>,
    pub rating: f64,
    pub total_trips: u32,
    pub created_at: DateTime<Utc>,
}

impl Driver {
    /// New drivers start offline and unverified; an admin flips
    /// `is_verified` once before they can be matched.
    pub fn new(name: String, phone: String, location: Option<GeoPoint>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name,
            phone,
            is_online: false,
            is_verified: false,
            current_location: location,
            last_location_update: location.map(|_| now),
            rating: 0.0,
            total_trips: 0,
            created_at: now,
        }
    }
}
