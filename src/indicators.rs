//! Client for the economic indicator API that publishes the daily UF value.
//!
//! One GET returns every indicator as JSON, e.g.
//! `{"uf": {"codigo": "uf", "valor": 37950.12}, "dolar": {...}}`.
//! Values are cached in [`AppCache::indicators`](crate::cache::AppCache).

use std::time::Duration;

use reqwest::{Client, Url};
use rust_decimal::Decimal;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info};

use crate::cache::AppCache;
use crate::pricing::calculators::{decimal_or_zero, parse_amount};

const USER_AGENT: &str = concat!("inverapp-web/", env!("CARGO_PKG_VERSION"));
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Error)]
pub enum IndicatorError {
    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("http request error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("indicator '{0}' missing from response")]
    MissingIndicator(String),
    #[error("indicator '{0}' has an unusable value")]
    InvalidValue(String),
}

#[derive(Clone)]
pub struct IndicatorClient {
    http: Client,
    url: Url,
    indicator: String,
}

impl IndicatorClient {
    pub fn new(url: &str, indicator: &str) -> Result<Self, IndicatorError> {
        let url = Url::parse(url)?;
        let http = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            http,
            url,
            indicator: indicator.to_string(),
        })
    }

    pub fn indicator(&self) -> &str {
        &self.indicator
    }

    /// Fetch the configured indicator straight from the API.
    pub async fn fetch(&self) -> Result<Decimal, IndicatorError> {
        let body: Value = self
            .http
            .get(self.url.clone())
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        parse_indicator(&body, &self.indicator)
    }

    /// Current value, served from cache when fresh.
    pub async fn current(&self, cache: &AppCache) -> Result<Decimal, IndicatorError> {
        if let Some(value) = cache.indicators.get(&self.indicator).await {
            debug!("Cache HIT for indicator: {}", self.indicator);
            return Ok(value);
        }

        debug!("Cache MISS for indicator: {}", self.indicator);
        let value = self.fetch().await?;
        cache
            .indicators
            .insert(self.indicator.clone(), value)
            .await;
        info!("Fetched {} = {}", self.indicator, value);
        Ok(value)
    }
}

/// Pull `body[name].valor` out of an indicator payload.
///
/// The value may be a JSON number or a localized string. Non-positive and
/// non-finite values are rejected since they would zero out every peso amount.
pub fn parse_indicator(body: &Value, name: &str) -> Result<Decimal, IndicatorError> {
    let raw = body
        .get(name)
        .and_then(|entry| entry.get("valor"))
        .ok_or_else(|| IndicatorError::MissingIndicator(name.to_string()))?;

    let value = match raw {
        Value::Number(n) => n.as_f64().map(decimal_or_zero).unwrap_or(Decimal::ZERO),
        Value::String(s) => parse_amount(s),
        _ => Decimal::ZERO,
    };

    if value <= Decimal::ZERO {
        return Err(IndicatorError::InvalidValue(name.to_string()));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    #[test]
    fn test_parse_indicator_number() {
        let body = json!({"version": "1.7.0", "uf": {"codigo": "uf", "valor": 37950.12}});
        let value = parse_indicator(&body, "uf").unwrap();
        assert!((value - dec!(37950.12)).abs() < dec!(0.0001));
    }

    #[test]
    fn test_parse_indicator_string() {
        let body = json!({"uf": {"valor": "37.950,12"}});
        assert_eq!(parse_indicator(&body, "uf").unwrap(), dec!(37950.12));
    }

    #[test]
    fn test_parse_indicator_missing() {
        let body = json!({"dolar": {"valor": 950.1}});
        assert!(matches!(
            parse_indicator(&body, "uf"),
            Err(IndicatorError::MissingIndicator(name)) if name == "uf"
        ));
    }

    #[test]
    fn test_parse_indicator_rejects_zero_and_garbage() {
        assert!(matches!(
            parse_indicator(&json!({"uf": {"valor": 0}}), "uf"),
            Err(IndicatorError::InvalidValue(_))
        ));
        assert!(matches!(
            parse_indicator(&json!({"uf": {"valor": null}}), "uf"),
            Err(IndicatorError::InvalidValue(_))
        ));
    }

    #[test]
    fn test_client_rejects_bad_url() {
        assert!(matches!(
            IndicatorClient::new("not a url", "uf"),
            Err(IndicatorError::InvalidUrl(_))
        ));
    }

    #[tokio::test]
    async fn test_current_prefers_cache() {
        let client = IndicatorClient::new("http://127.0.0.1:9/api", "uf").unwrap();
        let cache = AppCache::default();
        cache.indicators.insert("uf".to_string(), dec!(38000)).await;

        assert_eq!(client.current(&cache).await.unwrap(), dec!(38000));
    }
}
