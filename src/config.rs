//! Runtime configuration read from the environment (and `.env` via dotenvy).

use std::str::FromStr;
use std::time::Duration;

use rust_decimal::Decimal;

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),

    #[error("invalid value for {name}: {value}")]
    Invalid { name: &'static str, value: String },
}

/// Service configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub database_max_connections: u32,
    pub bind_addr: String,
    /// Indicator API endpoint
    pub uf_api_url: String,
    /// Key of the UF entry in the indicator payload
    pub uf_indicator: String,
    pub uf_cache_ttl: Duration,
    /// Fixed reservation amount in pesos
    pub reservation_pesos: Decimal,
}

impl Config {
    /// Read configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read configuration through an arbitrary lookup; empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let database_url = get("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?;

        Ok(Self {
            database_url,
            database_max_connections: parse_or(get("DATABASE_MAX_CONNECTIONS"), "DATABASE_MAX_CONNECTIONS", 10)?,
            bind_addr: get("BIND_ADDR").unwrap_or_else(|| "0.0.0.0:8080".to_string()),
            uf_api_url: get("UF_API_URL").unwrap_or_else(|| "https://mindicador.cl/api".to_string()),
            uf_indicator: get("UF_INDICATOR").unwrap_or_else(|| "uf".to_string()),
            uf_cache_ttl: Duration::from_secs(parse_or(get("UF_CACHE_TTL_SECS"), "UF_CACHE_TTL_SECS", 3600)?),
            reservation_pesos: parse_or(get("RESERVATION_PESOS"), "RESERVATION_PESOS", Decimal::new(100_000, 0))?,
        })
    }
}

fn parse_or<T: FromStr>(value: Option<String>, name: &'static str, default: T) -> Result<T, ConfigError> {
    match value {
        Some(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid { name, value: raw }),
        None => Ok(default),
    }
}
