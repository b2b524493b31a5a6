use axum::{Json, extract::State};
use std::sync::Arc;

use super::{ApiError, AppState, InsightsDto, PopularCategoriesDto};

pub async fn get_insights(
    State(state): State<Arc<AppState>>,
) -> Result<Json<InsightsDto>, ApiError> {
    let snapshot = state.insights().insights().await?;
    Ok(Json(snapshot.into()))
}

pub async fn popular_categories(
    State(state): State<Arc<AppState>>,
) -> Result<Json<PopularCategoriesDto>, ApiError> {
    let popular_categories = state.insights().popular_categories().await?;
    Ok(Json(PopularCategoriesDto { popular_categories }))
}
