use std::env;
use std::path::PathBuf;

use crate::error::AppError;

#[derive(Debug, Clone)]
pub struct Config {
    pub http_port: u16,
    pub log_level: String,
    pub event_buffer_size: usize,
    pub price_per_stop: f64,
    pub gazetteer_path: Option<PathBuf>,
    pub reverse_geocode_radius_km: f64,
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        let _ = dotenvy::dotenv();

        let config = Self {
            http_port: parse_or_default("HTTP_PORT", 3000)?,
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            event_buffer_size: parse_or_default("EVENT_BUFFER_SIZE", 1024)?,
            price_per_stop: parse_or_default("PRICE_PER_STOP", 250.0)?,
            gazetteer_path: env::var("GAZETTEER_PATH").ok().map(PathBuf::from),
            reverse_geocode_radius_km: parse_or_default("REVERSE_GEOCODE_RADIUS_KM", 25.0)?,
        };

        if !(config.price_per_stop.is_finite() && config.price_per_stop >= 0.0) {
            return Err(AppError::Internal(
                "invalid PRICE_PER_STOP: must be a non-negative number".to_string(),
            ));
        }
        if config.event_buffer_size == 0 {
            return Err(AppError::Internal(
                "invalid EVENT_BUFFER_SIZE: must be > 0".to_string(),
            ));
        }

        Ok(config)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            http_port: 3000,
            log_level: "info".to_string(),
            event_buffer_size: 1024,
            price_per_stop: 250.0,
            gazetteer_path: None,
            reverse_geocode_radius_km: 25.0,
        }
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
