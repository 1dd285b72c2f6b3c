pub mod coordinator;
pub mod locator;
pub mod reward;

use std::time::Duration;

use rust_decimal::Decimal;

use crate::config::Config;

/// Knobs the coordinator and locator run with. Radius and reward rate are
/// configuration inputs, never hard-coded.
#[derive(Debug, Clone)]
pub struct DispatchPolicy {
    pub search_radius_km: f64,
    pub candidate_limit: usize,
    pub reward_rate: Decimal,
    pub min_driver_points: i64,
    pub dispatch_timeout: Duration,
}

impl From<&Config> for DispatchPolicy {
    fn from(config: &Config) -> Self {
        Self {
            search_radius_km: config.search_radius_km,
            candidate_limit: config.candidate_limit,
            reward_rate: config.reward_rate,
            min_driver_points: config.min_driver_points,
            dispatch_timeout: Duration::from_millis(config.dispatch_timeout_ms),
        }
    }
}
