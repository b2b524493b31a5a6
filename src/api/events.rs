use axum::{
    Json,
    extract::State,
    http::HeaderMap,
};
use std::sync::Arc;
use tracing::info;

use super::{ApiError, AppState, LogSearchRequest, LogSearchResponse};
use crate::services::LogSearchInput;

pub async fn log_search(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(request): Json<LogSearchRequest>,
) -> Result<Json<LogSearchResponse>, ApiError> {
    let Some(query_text) = request.query_text else {
        return Err(ApiError::validation("query_text required"));
    };

    let caller = caller_identity(request.user_id, &headers);

    let input = LogSearchInput {
        user_id: request.user_id,
        query_text,
        category: request.category,
        location: request.location,
        results_count: request.results_count,
    };

    let id = state.events().record(input, &caller).await?;

    info!(event_id = id, "Logged search event");

    Ok(Json(LogSearchResponse {
        status: "logged".to_string(),
        id,
    }))
}

/// Rate-limit identity: user id when supplied, else the forwarded client
/// address, else one shared anonymous bucket.
fn caller_identity(user_id: Option<i64>, headers: &HeaderMap) -> String {
    if let Some(id) = user_id {
        return format!("user:{id}");
    }

    headers
        .get("x-forwarded-for")
        .and_then(|h| h.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|ip| format!("ip:{}", ip.trim()))
        .unwrap_or_else(|| "anonymous".to_string())
}
