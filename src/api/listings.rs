use axum::{
    Json,
    extract::{Query, State},
};
use serde::Deserialize;
use std::sync::Arc;

use super::{ApiError, AppState, ListingDto, QuickMatchDto, SearchResultsDto};
use crate::services::ListingSearchParams;

/// Params for `GET /search/` — the general browse surface.
#[derive(Debug, Deserialize)]
pub struct BrowseQuery {
    pub search: Option<String>,
    pub category: Option<String>,
    pub location: Option<String>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

/// Params for `GET /search/listings` — the sortable storefront query.
#[derive(Debug, Deserialize)]
pub struct ListingSearchQuery {
    pub q: Option<String>,
    pub category: Option<String>,
    pub sort: Option<String>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct QuickQuery {
    pub q: String,
}

pub async fn browse_listings(
    State(state): State<Arc<AppState>>,
    Query(params): Query<BrowseQuery>,
) -> Result<Json<SearchResultsDto>, ApiError> {
    let page = state
        .search()
        .search(ListingSearchParams {
            term: params.search,
            category: params.category,
            location: params.location,
            sort: None,
            limit: params.limit,
            offset: params.offset,
        })
        .await?;

    Ok(Json(SearchResultsDto {
        count: page.total,
        results: page.listings.into_iter().map(ListingDto::from).collect(),
    }))
}

pub async fn search_listings(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListingSearchQuery>,
) -> Result<Json<SearchResultsDto>, ApiError> {
    let page = state
        .search()
        .search(ListingSearchParams {
            term: params.q,
            category: params.category,
            location: None,
            sort: params.sort,
            limit: params.limit,
            offset: params.offset,
        })
        .await?;

    Ok(Json(SearchResultsDto {
        count: page.total,
        results: page.listings.into_iter().map(ListingDto::from).collect(),
    }))
}

pub async fn quick_search(
    State(state): State<Arc<AppState>>,
    Query(params): Query<QuickQuery>,
) -> Result<Json<Vec<QuickMatchDto>>, ApiError> {
    let matches = state.search().quick_match(&params.q).await?;

    Ok(Json(
        matches
            .into_iter()
            .map(|l| QuickMatchDto {
                id: l.id,
                title: l.title,
                price: l.price,
            })
            .collect(),
    ))
}
