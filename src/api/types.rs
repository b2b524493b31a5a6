use serde::{Deserialize, Serialize};

use crate::db::ListingWithImages;
use crate::services::{InsightsSnapshot, TermCount};

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

/// Typed log-endpoint payload. `query_text` is optional at the wire level so
/// a missing field produces the documented validation error rather than a
/// deserialization rejection; `device_type` is accepted but unused.
#[derive(Debug, Deserialize)]
pub struct LogSearchRequest {
    pub query_text: Option<String>,
    pub category: Option<String>,
    pub location: Option<String>,
    #[serde(default)]
    pub results_count: i32,
    pub user_id: Option<i64>,
    pub device_type: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LogSearchResponse {
    pub status: String,
    pub id: i64,
}

#[derive(Debug, Serialize)]
pub struct ListingImageDto {
    pub id: i64,
    pub url: String,
}

#[derive(Debug, Serialize)]
pub struct ListingDto {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub category: String,
    pub location: String,
    pub price: f64,
    pub created_at: String,
    pub images: Vec<ListingImageDto>,
}

impl From<ListingWithImages> for ListingDto {
    fn from(row: ListingWithImages) -> Self {
        Self {
            id: row.listing.id,
            title: row.listing.title,
            description: row.listing.description,
            category: row.listing.category,
            location: row.listing.location,
            price: row.listing.price,
            created_at: row.listing.created_at,
            images: row
                .images
                .into_iter()
                .map(|i| ListingImageDto { id: i.id, url: i.url })
                .collect(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SearchResultsDto {
    pub results: Vec<ListingDto>,
    /// Full matching cardinality, not the page size.
    pub count: u64,
}

#[derive(Debug, Serialize)]
pub struct QuickMatchDto {
    pub id: i64,
    pub title: String,
    pub price: f64,
}

#[derive(Debug, Serialize)]
pub struct TermCountDto {
    pub term: String,
    pub count: i64,
}

impl From<TermCount> for TermCountDto {
    fn from(tc: TermCount) -> Self {
        Self {
            term: tc.term,
            count: tc.count,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct InsightsDto {
    pub popular_searches: Vec<TermCountDto>,
    pub suggested_searches: Vec<String>,
}

impl From<InsightsSnapshot> for InsightsDto {
    fn from(snapshot: InsightsSnapshot) -> Self {
        Self {
            popular_searches: snapshot.popular.into_iter().map(Into::into).collect(),
            suggested_searches: snapshot.suggested,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PopularCategoriesDto {
    pub popular_categories: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct SystemStatus {
    pub version: String,
    pub uptime: u64,
    pub listings: u64,
    pub search_events: u64,
}
