use axum::{Json, extract::State};
use std::sync::Arc;

use super::{ApiError, AppState, SystemStatus};

pub async fn get_status(
    State(state): State<Arc<AppState>>,
) -> Result<Json<SystemStatus>, ApiError> {
    state.store().ping().await?;

    let listings = state.store().listing_count().await?;
    let search_events = state.store().search_event_count().await?;

    Ok(Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime: state.start_time.elapsed().as_secs(),
        listings,
        search_events,
    }))
}
