use axum::{
    Router,
    http::{HeaderValue, StatusCode},
    middleware,
    routing::{get, post},
};
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::state::SharedState;

mod error;
mod events;
mod insights;
mod listings;
mod observability;
mod system;
mod types;

pub use error::ApiError;
pub use types::*;

use metrics_exporter_prometheus::PrometheusHandle;

#[derive(Clone)]
pub struct AppState {
    pub shared: Arc<SharedState>,

    pub start_time: std::time::Instant,

    pub prometheus_handle: Option<PrometheusHandle>,
}

impl AppState {
    #[must_use]
    pub fn store(&self) -> &crate::db::Store {
        &self.shared.store
    }

    #[must_use]
    pub fn search(&self) -> &Arc<crate::services::SearchService> {
        &self.shared.search
    }

    #[must_use]
    pub fn events(&self) -> &Arc<crate::services::EventLogService> {
        &self.shared.events
    }

    #[must_use]
    pub fn insights(&self) -> &Arc<crate::services::InsightsService> {
        &self.shared.insights
    }
}

pub fn create_app_state(
    shared: Arc<SharedState>,
    prometheus_handle: Option<PrometheusHandle>,
) -> Arc<AppState> {
    Arc::new(AppState {
        shared,
        start_time: std::time::Instant::now(),
        prometheus_handle,
    })
}

pub async fn create_app_state_from_config(
    config: Config,
    prometheus_handle: Option<PrometheusHandle>,
) -> anyhow::Result<Arc<AppState>> {
    let shared = Arc::new(SharedState::new(config).await?);
    Ok(create_app_state(shared, prometheus_handle))
}

pub async fn router(state: Arc<AppState>) -> Router {
    let config = state.shared.config().await;
    let cors_origins = config.server.cors_allowed_origins;
    let timeout_seconds = config.server.request_timeout_seconds;

    let cors_layer = if cors_origins.contains(&"*".to_string()) {
        CorsLayer::new().allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> =
            cors_origins.iter().filter_map(|s| s.parse().ok()).collect();
        CorsLayer::new().allow_origin(origins)
    };

    let search_routes = Router::new()
        .route("/log", post(events::log_search))
        .route("/insights", get(insights::get_insights))
        .route("/popular-categories", get(insights::popular_categories))
        .route("/", get(listings::browse_listings))
        .route("/quick", get(listings::quick_search))
        .route("/listings", get(listings::search_listings));

    Router::new()
        .nest("/search", search_routes)
        // nest() only matches the bare prefix for the inner "/" route
        .route("/search/", get(listings::browse_listings))
        .route("/system/status", get(system::get_status))
        .route("/metrics", get(observability::get_metrics))
        .layer(cors_layer.allow_methods(Any).allow_headers(Any))
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(timeout_seconds),
        ))
        .layer(middleware::from_fn(observability::track_metrics))
        .with_state(state)
}
