use sea_orm::entity::prelude::*;

/// Append-only search event log. Rows are immutable once inserted;
/// retention is an external concern.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "search_events")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub user_id: Option<i64>,
    pub query_text: String,
    pub category: Option<String>,
    pub location: Option<String>,
    pub results_count: i32,
    pub created_at: String, // RFC 3339, assigned by the store at insert
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
