//! In-memory caching using moka
//!
//! Stock listings and commission rates change a few times a day at most, and
//! the UF value changes once a day, so modest TTLs keep the database and the
//! indicator API out of the hot path of the quoting form.

use moka::future::Cache;
use rust_decimal::Decimal;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use uuid::Uuid;

use crate::pricing::models::Unit;

/// Application cache holding stock, commissions and indicator values
#[derive(Clone)]
pub struct AppCache {
    /// Parsed stock per project (project -> units)
    pub units: Cache<String, Arc<Vec<Unit>>>,
    /// Commission rates (broker:project -> rate)
    pub commissions: Cache<String, Decimal>,
    /// Indicator values (indicator name -> pesos)
    pub indicators: Cache<String, Decimal>,
}

impl AppCache {
    /// Create a new cache instance; `indicator_ttl` bounds how stale the UF value may get
    pub fn new(indicator_ttl: Duration) -> Self {
        Self {
            // Stock: 200 projects, 5 min TTL (reservations change unit status)
            units: Cache::builder()
                .max_capacity(200)
                .time_to_live(Duration::from_secs(5 * 60))
                .build(),

            // Commissions: 5000 broker/project pairs, 30 min TTL
            commissions: Cache::builder()
                .max_capacity(5_000)
                .time_to_live(Duration::from_secs(30 * 60))
                .time_to_idle(Duration::from_secs(10 * 60))
                .build(),

            // Indicators: a handful of entries
            indicators: Cache::builder()
                .max_capacity(8)
                .time_to_live(indicator_ttl)
                .build(),
        }
    }

    /// Get cache statistics for monitoring
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            units_size: self.units.entry_count(),
            commissions_size: self.commissions.entry_count(),
            indicators_size: self.indicators.entry_count(),
        }
    }

    /// Invalidate all caches
    pub fn invalidate_all(&self) {
        self.units.invalidate_all();
        self.commissions.invalidate_all();
        self.indicators.invalidate_all();
        info!("All caches invalidated");
    }

    /// Drop a project's stock, e.g. after a unit is reserved
    pub async fn invalidate_project(&self, project: &str) {
        self.units.invalidate(project).await;
        info!("Stock cache invalidated for project: {}", project);
    }

    /// Generate cache key for a commission rate
    pub fn commission_key(broker_id: Uuid, project: &str) -> String {
        format!("{}:{}", broker_id, project)
    }
}

impl Default for AppCache {
    fn default() -> Self {
        Self::new(Duration::from_secs(60 * 60))
    }
}

/// Cache statistics for monitoring endpoint
#[derive(Debug, Clone, Serialize)]
pub struct CacheStats {
    pub units_size: u64,
    pub commissions_size: u64,
    pub indicators_size: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_commission_key() {
        let key = AppCache::commission_key(Uuid::nil(), "Edificio Mirador");
        assert_eq!(key, "00000000-0000-0000-0000-000000000000:Edificio Mirador");
    }

    #[tokio::test]
    async fn test_invalidate_project() {
        let cache = AppCache::default();
        cache
            .units
            .insert("Edificio Mirador".to_string(), Arc::new(vec![]))
            .await;
        cache
            .indicators
            .insert("uf".to_string(), dec!(37950.12))
            .await;

        cache.invalidate_project("Edificio Mirador").await;

        assert!(cache.units.get("Edificio Mirador").await.is_none());
        assert_eq!(cache.indicators.get("uf").await, Some(dec!(37950.12)));
    }
}
