use sea_orm::entity::prelude::*;
use serde::Serialize;

/// Read-only catalog view. Rows are owned by the listing service;
/// this subsystem never inserts, updates, or deletes them.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "listings")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub title: String,
    #[sea_orm(column_type = "Text")]
    pub description: String,
    pub category: String,
    pub location: String,
    pub price: f64,
    pub created_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::listing_images::Entity")]
    ListingImages,
}

impl Related<super::listing_images::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ListingImages.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
