use anyhow::Result;

use crate::config::SearchConfig;
use crate::db::{ListingPage, Store};
use crate::entities::listings;

/// Sort selector for listing queries. "Relevance" is documented recency
/// (newest first); unrecognized selectors fall back to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortKey {
    PriceLow,
    PriceHigh,
    #[default]
    Relevance,
}

impl SortKey {
    #[must_use]
    pub fn parse(value: &str) -> Self {
        match value {
            "price_low" => Self::PriceLow,
            "price_high" => Self::PriceHigh,
            _ => Self::Relevance,
        }
    }
}

/// Caller-facing search parameters before normalization.
#[derive(Debug, Clone, Default)]
pub struct ListingSearchParams {
    pub term: Option<String>,
    pub category: Option<String>,
    pub location: Option<String>,
    pub sort: Option<String>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

/// Normalized predicate + ordering + page window handed to the repository.
#[derive(Debug, Clone)]
pub struct ListingQuery {
    pub term: Option<String>,
    pub category: Option<String>,
    pub location: Option<String>,
    pub sort: SortKey,
    pub limit: u64,
    pub offset: u64,
}

/// Translates search requests into catalog queries. Empty-string filters are
/// treated as absent, since frontends habitually send `q=&category=`.
pub struct SearchService {
    store: Store,
    config: SearchConfig,
}

impl SearchService {
    #[must_use]
    pub const fn new(store: Store, config: SearchConfig) -> Self {
        Self { store, config }
    }

    pub async fn search(&self, params: ListingSearchParams) -> Result<ListingPage> {
        let query = self.plan(params);
        self.store.search_listings(&query).await
    }

    /// Bounded suggestion search. Blank input is an empty result, not an
    /// error.
    pub async fn quick_match(&self, q: &str) -> Result<Vec<listings::Model>> {
        if q.trim().is_empty() {
            return Ok(Vec::new());
        }

        self.store
            .quick_match_listings(q, self.config.quick_match_limit)
            .await
    }

    fn plan(&self, params: ListingSearchParams) -> ListingQuery {
        ListingQuery {
            term: normalize(params.term),
            category: normalize(params.category),
            location: normalize(params.location),
            sort: params
                .sort
                .as_deref()
                .map(SortKey::parse)
                .unwrap_or_default(),
            limit: clamp_limit(
                params.limit,
                self.config.default_page_size,
                self.config.max_page_size,
            ),
            offset: params.offset.unwrap_or(0),
        }
    }
}

fn normalize(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

fn clamp_limit(requested: Option<u64>, default: u64, max: u64) -> u64 {
    requested.unwrap_or(default).clamp(1, max)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_sort_keys() {
        assert_eq!(SortKey::parse("price_low"), SortKey::PriceLow);
        assert_eq!(SortKey::parse("price_high"), SortKey::PriceHigh);
        assert_eq!(SortKey::parse("relevance"), SortKey::Relevance);
    }

    #[test]
    fn unknown_sort_falls_back_to_relevance() {
        assert_eq!(SortKey::parse("best_match"), SortKey::Relevance);
        assert_eq!(SortKey::parse(""), SortKey::Relevance);
    }

    #[test]
    fn blank_filters_are_absent() {
        assert_eq!(normalize(Some(String::new())), None);
        assert_eq!(normalize(Some("   ".to_string())), None);
        assert_eq!(normalize(Some("Tools".to_string())), Some("Tools".to_string()));
        assert_eq!(normalize(None), None);
    }

    #[test]
    fn limits_are_clamped_to_the_cap() {
        assert_eq!(clamp_limit(None, 50, 200), 50);
        assert_eq!(clamp_limit(Some(10), 50, 200), 10);
        assert_eq!(clamp_limit(Some(5000), 50, 200), 200);
        assert_eq!(clamp_limit(Some(0), 50, 200), 1);
    }
}
