use std::sync::Arc;
use tokio::sync::RwLock;

use crate::config::Config;
use crate::db::Store;
use crate::services::{EventLogService, InsightsService, SearchService};

#[derive(Clone)]
pub struct SharedState {
    pub config: Arc<RwLock<Config>>,

    pub store: Store,

    pub search: Arc<SearchService>,

    pub events: Arc<EventLogService>,

    pub insights: Arc<InsightsService>,
}

impl SharedState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let store = Store::with_pool_options(
            &config.general.database_path,
            config.general.max_db_connections,
            config.general.min_db_connections,
        )
        .await?;

        let search = Arc::new(SearchService::new(store.clone(), config.search.clone()));
        let events = Arc::new(EventLogService::new(store.clone(), &config.search));
        let insights = Arc::new(InsightsService::new(
            store.clone(),
            config.insights.clone(),
        ));

        Ok(Self {
            config: Arc::new(RwLock::new(config)),
            store,
            search,
            events,
            insights,
        })
    }

    pub async fn config(&self) -> Config {
        self.config.read().await.clone()
    }
}
