use std::time::{Duration, Instant};

use anyhow::Result;
use tokio::sync::RwLock;
use tracing::debug;

use crate::config::InsightsConfig;
use crate::db::Store;

#[derive(Debug, Clone)]
pub struct TermCount {
    pub term: String,
    pub count: i64,
}

#[derive(Debug, Clone)]
pub struct InsightsSnapshot {
    pub popular: Vec<TermCount>,
    pub suggested: Vec<String>,
}

/// Batch aggregations over the event log behind a short-TTL in-memory cache.
/// Results reflect a point-in-time cut of the log; staleness is bounded by
/// the configured TTL, and a TTL of 0 recomputes on every call. Aggregates
/// are never persisted.
pub struct InsightsService {
    store: Store,
    config: InsightsConfig,
    insights_cache: RwLock<Option<(Instant, InsightsSnapshot)>>,
    categories_cache: RwLock<Option<(Instant, Vec<String>)>>,
}

impl InsightsService {
    #[must_use]
    pub fn new(store: Store, config: InsightsConfig) -> Self {
        Self {
            store,
            config,
            insights_cache: RwLock::new(None),
            categories_cache: RwLock::new(None),
        }
    }

    const fn ttl(&self) -> Duration {
        Duration::from_secs(self.config.cache_ttl_seconds)
    }

    pub async fn insights(&self) -> Result<InsightsSnapshot> {
        if self.config.cache_ttl_seconds > 0 {
            let cache = self.insights_cache.read().await;
            if let Some((at, snapshot)) = cache.as_ref() {
                if at.elapsed() < self.ttl() {
                    return Ok(snapshot.clone());
                }
            }
        }

        let snapshot = self.compute_insights().await?;

        if self.config.cache_ttl_seconds > 0 {
            let mut cache = self.insights_cache.write().await;
            *cache = Some((Instant::now(), snapshot.clone()));
        }

        Ok(snapshot)
    }

    pub async fn popular_categories(&self) -> Result<Vec<String>> {
        if self.config.cache_ttl_seconds > 0 {
            let cache = self.categories_cache.read().await;
            if let Some((at, categories)) = cache.as_ref() {
                if at.elapsed() < self.ttl() {
                    return Ok(categories.clone());
                }
            }
        }

        let categories = self
            .store
            .popular_categories(self.config.category_limit)
            .await?;

        if self.config.cache_ttl_seconds > 0 {
            let mut cache = self.categories_cache.write().await;
            *cache = Some((Instant::now(), categories.clone()));
        }

        Ok(categories)
    }

    async fn compute_insights(&self) -> Result<InsightsSnapshot> {
        let popular = self
            .store
            .popular_terms(self.config.popular_limit)
            .await?
            .into_iter()
            .map(|(term, count)| TermCount { term, count })
            .collect();

        let suggested = self
            .store
            .suggested_terms(
                self.config.low_result_threshold,
                self.config.suggested_limit,
            )
            .await?;

        debug!("Recomputed search insights from event log");

        Ok(InsightsSnapshot { popular, suggested })
    }
}
