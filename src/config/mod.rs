use serde::Deserialize;
use std::env;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{name} has an invalid value: {value}")]
    Invalid { name: &'static str, value: String },
}

// Root configuration, one section per concern
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub app: AppConfig,
    pub database: DatabaseConfig,
    pub redis: Option<RedisConfig>,
    pub booking: BookingConfig,
    pub features: FeatureFlags,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub environment: String,
    pub rust_log: String,
    pub log_format: LogFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Plain,
    Json,
}

impl FromStr for LogFormat {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "plain" | "text" => Ok(LogFormat::Plain),
            "json" => Ok(LogFormat::Json),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub pool_size: u32,
}

// Redis is only used for the show catalog cache; absent means no cache
#[derive(Debug, Clone, Deserialize)]
pub struct RedisConfig {
    pub url: String,
    pub catalog_ttl_seconds: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BookingConfig {
    pub hold_minutes: i64,
    pub sweep_interval_seconds: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FeatureFlags {
    pub enable_catalog_cache: bool,
    pub enable_hold_sweeper: bool,
}

pub const MAX_HOLD_MINUTES: i64 = 24 * 60;

impl BookingConfig {
    /// Holds must outlive the request that creates them and stay within a day.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=MAX_HOLD_MINUTES).contains(&self.hold_minutes) {
            return Err(ConfigError::Invalid {
                name: "BOOKING_HOLD_MINUTES",
                value: self.hold_minutes.to_string(),
            });
        }
        if self.sweep_interval_seconds == 0 {
            return Err(ConfigError::Invalid {
                name: "HOLD_SWEEP_INTERVAL_SECONDS",
                value: self.sweep_interval_seconds.to_string(),
            });
        }
        Ok(())
    }

    // Clamped so a hand-built config can never yield an already-lapsed hold
    pub fn hold_duration(&self) -> chrono::Duration {
        chrono::Duration::minutes(self.hold_minutes.clamp(1, MAX_HOLD_MINUTES))
    }
}

impl Default for BookingConfig {
    fn default() -> Self {
        Self {
            hold_minutes: 10,
            sweep_interval_seconds: 60,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let redis = match env::var("REDIS_URL") {
            Ok(url) if !url.trim().is_empty() => Some(RedisConfig {
                url,
                catalog_ttl_seconds: parse_or("CATALOG_CACHE_TTL_SECONDS", 300)?,
            }),
            _ => None,
        };

        let booking = BookingConfig {
            hold_minutes: parse_or("BOOKING_HOLD_MINUTES", 10)?,
            sweep_interval_seconds: parse_or("HOLD_SWEEP_INTERVAL_SECONDS", 60)?,
        };
        booking.validate()?;

        Ok(Config {
            app: AppConfig {
                host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: parse_or("PORT", 8000)?,
                environment: env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),
                rust_log: env::var("RUST_LOG")
                    .unwrap_or_else(|_| "cinema_booking=debug,tower_http=debug".to_string()),
                log_format: parse_or("LOG_FORMAT", LogFormat::Plain)?,
            },
            database: DatabaseConfig {
                url: env::var("DATABASE_URL").map_err(|_| ConfigError::Missing("DATABASE_URL"))?,
                pool_size: parse_or("DB_POOL_SIZE", 20)?,
            },
            redis,
            booking,
            features: FeatureFlags {
                enable_catalog_cache: parse_or("ENABLE_CATALOG_CACHE", true)?,
                enable_hold_sweeper: parse_or("ENABLE_HOLD_SWEEPER", true)?,
            },
        })
    }
}

fn parse_or<T: FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(raw) => parse_value(name, &raw),
        Err(_) => Ok(default),
    }
}

fn parse_value<T: FromStr>(name: &'static str, raw: &str) -> Result<T, ConfigError> {
    raw.trim().parse().map_err(|_| ConfigError::Invalid {
        name,
        value: raw.to_string(),
    })
}
