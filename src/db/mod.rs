use std::path::Path;
use std::time::Duration;

use anyhow::Result;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Statement};
use tracing::info;

use crate::services::search::ListingQuery;

pub mod migrator;
pub mod repositories;

pub use repositories::event::SearchEventInput;
pub use repositories::listing::{ListingPage, ListingWithImages};

use crate::entities::listings;

#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
}

impl Store {
    pub async fn new(db_url: &str) -> Result<Self> {
        Self::with_pool_options(db_url, 5, 1).await
    }

    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self> {
        use sea_orm_migration::MigratorTrait;

        if !db_url.contains(":memory:") {
            let path_str = db_url.trim_start_matches("sqlite:");
            if let Some(parent) = Path::new(path_str).parent() {
                tokio::fs::create_dir_all(parent).await.ok();
            }
            if !Path::new(path_str).exists() {
                std::fs::File::create(path_str)?;
            }
        }

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(300))
            .max_lifetime(Duration::from_secs(600))
            .sqlx_logging(false);

        let conn = Database::connect(opt).await?;

        migrator::Migrator::up(&conn, None).await?;

        info!(
            "Database connected & migrations applied (pool: {}-{})",
            min_connections, max_connections
        );

        Ok(Self { conn })
    }

    pub async fn ping(&self) -> Result<()> {
        let backend = self.conn.get_database_backend();
        self.conn
            .query_one(Statement::from_string(backend, "SELECT 1".to_string()))
            .await?;
        Ok(())
    }

    fn listing_repo(&self) -> repositories::listing::ListingRepository {
        repositories::listing::ListingRepository::new(self.conn.clone())
    }

    fn event_repo(&self) -> repositories::event::EventRepository {
        repositories::event::EventRepository::new(self.conn.clone())
    }

    pub async fn record_search_event(&self, input: &SearchEventInput) -> Result<i64> {
        self.event_repo().record(input).await
    }

    pub async fn popular_terms(&self, limit: u64) -> Result<Vec<(String, i64)>> {
        self.event_repo().popular_terms(limit).await
    }

    pub async fn suggested_terms(&self, threshold: i32, limit: u64) -> Result<Vec<String>> {
        self.event_repo().suggested_terms(threshold, limit).await
    }

    pub async fn popular_categories(&self, limit: u64) -> Result<Vec<String>> {
        self.event_repo().popular_categories(limit).await
    }

    pub async fn search_event_count(&self) -> Result<u64> {
        self.event_repo().count().await
    }

    pub async fn search_listings(&self, query: &ListingQuery) -> Result<ListingPage> {
        self.listing_repo().search(query).await
    }

    pub async fn quick_match_listings(
        &self,
        term: &str,
        limit: u64,
    ) -> Result<Vec<listings::Model>> {
        self.listing_repo().quick_match(term, limit).await
    }

    pub async fn listing_count(&self) -> Result<u64> {
        self.listing_repo().count().await
    }
}
