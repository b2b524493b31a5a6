use anyhow::Result;
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};

use crate::entities::{prelude::*, search_events};

/// Fields for one search event; id and timestamp are assigned at insert.
#[derive(Debug, Clone, Default)]
pub struct SearchEventInput {
    pub user_id: Option<i64>,
    pub query_text: String,
    pub category: Option<String>,
    pub location: Option<String>,
    pub results_count: i32,
}

/// Append-only store of search events. There is no update or delete path;
/// retention is an external concern.
pub struct EventRepository {
    conn: DatabaseConnection,
}

impl EventRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Appends one event and returns its store-assigned id.
    pub async fn record(&self, input: &SearchEventInput) -> Result<i64> {
        let active_model = search_events::ActiveModel {
            user_id: Set(input.user_id),
            query_text: Set(input.query_text.clone()),
            category: Set(input.category.clone()),
            location: Set(input.location.clone()),
            results_count: Set(input.results_count),
            created_at: Set(chrono::Utc::now().to_rfc3339()),
            ..Default::default()
        };

        let res = SearchEvents::insert(active_model).exec(&self.conn).await?;
        Ok(res.last_insert_id)
    }

    /// Term frequencies over the whole log, ordered by count descending.
    /// Ties break on earliest first occurrence (MIN(id) ascending) so the
    /// ordering is reproducible across runs.
    pub async fn popular_terms(&self, limit: u64) -> Result<Vec<(String, i64)>> {
        let rows = SearchEvents::find()
            .select_only()
            .column(search_events::Column::QueryText)
            .column_as(search_events::Column::Id.count(), "freq")
            .group_by(search_events::Column::QueryText)
            .order_by_desc(search_events::Column::Id.count())
            .order_by_asc(search_events::Column::Id.min())
            .limit(limit)
            .into_tuple::<(String, i64)>()
            .all(&self.conn)
            .await?;

        Ok(rows)
    }

    /// Terms whose individual events fell below the result-count threshold.
    /// The filter applies per-event before grouping: a term with one
    /// well-served event and one starved event is ranked by the starved
    /// event alone.
    pub async fn suggested_terms(&self, threshold: i32, limit: u64) -> Result<Vec<String>> {
        let rows = SearchEvents::find()
            .select_only()
            .column(search_events::Column::QueryText)
            .column_as(search_events::Column::Id.count(), "freq")
            .filter(search_events::Column::ResultsCount.lt(threshold))
            .group_by(search_events::Column::QueryText)
            .order_by_desc(search_events::Column::Id.count())
            .order_by_asc(search_events::Column::Id.min())
            .limit(limit)
            .into_tuple::<(String, i64)>()
            .all(&self.conn)
            .await?;

        Ok(rows.into_iter().map(|(term, _)| term).collect())
    }

    /// Category labels by event frequency, events without a category excluded.
    pub async fn popular_categories(&self, limit: u64) -> Result<Vec<String>> {
        let rows = SearchEvents::find()
            .select_only()
            .column(search_events::Column::Category)
            .column_as(search_events::Column::Id.count(), "freq")
            .filter(search_events::Column::Category.is_not_null())
            .group_by(search_events::Column::Category)
            .order_by_desc(search_events::Column::Id.count())
            .order_by_asc(search_events::Column::Id.min())
            .limit(limit)
            .into_tuple::<(String, i64)>()
            .all(&self.conn)
            .await?;

        Ok(rows.into_iter().map(|(category, _)| category).collect())
    }

    pub async fn count(&self) -> Result<u64> {
        Ok(SearchEvents::find().count(&self.conn).await?)
    }
}
