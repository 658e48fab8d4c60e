//! InverApp back office: quotation pricing, quotation sheets, notification
//! e-mails and the sales dashboard, served over axum.

pub mod cache;
pub mod config;
pub mod dashboard;
pub mod db;
pub mod error;
pub mod format;
pub mod indicators;
pub mod models;
pub mod notifications;
pub mod pricing;
pub mod routes;

use std::sync::Arc;

use sqlx::PgPool;

use crate::cache::AppCache;
use crate::config::Config;
use crate::indicators::{IndicatorClient, IndicatorError};

/// Shared state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub cache: AppCache,
    pub indicators: IndicatorClient,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(db: PgPool, config: Config) -> Result<Self, IndicatorError> {
        let indicators = IndicatorClient::new(&config.uf_api_url, &config.uf_indicator)?;
        Ok(Self {
            db,
            cache: AppCache::new(config.uf_cache_ttl),
            indicators,
            config: Arc::new(config),
        })
    }
}
