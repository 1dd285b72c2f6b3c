use std::env;

use rust_decimal::Decimal;

use crate::error::AppError;

#[derive(Debug, Clone)]
pub struct Config {
    pub http_port: u16,
    pub log_level: String,
    pub event_buffer_size: usize,
    /// Matching radius around the pickup point, in kilometers.
    pub search_radius_km: f64,
    /// Maximum number of candidate drivers considered per dispatch attempt.
    pub candidate_limit: usize,
    /// Fraction of the order cost awarded as points on completion.
    pub reward_rate: Decimal,
    /// Minimum ledger balance a driver needs to be matchable.
    pub min_driver_points: i64,
    pub dispatch_timeout_ms: u64,
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        let _ = dotenvy::dotenv();

        Ok(Self {
            http_port: parse_or_default("HTTP_PORT", 3000)?,
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            event_buffer_size: parse_or_default("EVENT_BUFFER_SIZE", 1024)?,
            search_radius_km: parse_or_default("SEARCH_RADIUS_KM", 5.0)?,
            candidate_limit: parse_or_default("CANDIDATE_LIMIT", 10)?,
            reward_rate: parse_or_default("REWARD_RATE", Decimal::new(10, 2))?,
            min_driver_points: parse_or_default("MIN_DRIVER_POINTS", 0)?,
            dispatch_timeout_ms: parse_or_default("DISPATCH_TIMEOUT_MS", 2_000)?,
        })
    }
}

fn parse_or_default<T>(key: &str, default: T) -> Result<T, AppError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .parse::<T>()
            .map_err(|err| AppError::Internal(format!("invalid {key}: {err}"))),
        Err(_) => Ok(default),
    }
}
