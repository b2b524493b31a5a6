use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Insights aggregations group on query_text over the whole log
        manager
            .create_index(
                Index::create()
                    .name("idx_search_events_query_text")
                    .table(SearchEvents::Table)
                    .col(SearchEvents::QueryText)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_search_events_created_at")
                    .table(SearchEvents::Table)
                    .col(SearchEvents::CreatedAt)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        // Recency is the default listing sort
        manager
            .create_index(
                Index::create()
                    .name("idx_listings_created_at")
                    .table(Listings::Table)
                    .col(Listings::CreatedAt)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_listing_images_listing_id")
                    .table(ListingImages::Table)
                    .col(ListingImages::ListingId)
                    .if_not_exists()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .name("idx_search_events_query_text")
                    .table(SearchEvents::Table)
                    .to_owned(),
            )
            .await?;
        manager
            .drop_index(
                Index::drop()
                    .name("idx_search_events_created_at")
                    .table(SearchEvents::Table)
                    .to_owned(),
            )
            .await?;
        manager
            .drop_index(
                Index::drop()
                    .name("idx_listings_created_at")
                    .table(Listings::Table)
                    .to_owned(),
            )
            .await?;
        manager
            .drop_index(
                Index::drop()
                    .name("idx_listing_images_listing_id")
                    .table(ListingImages::Table)
                    .to_owned(),
            )
            .await
    }
}

#[derive(Iden)]
enum SearchEvents {
    Table,
    QueryText,
    CreatedAt,
}

#[derive(Iden)]
enum Listings {
    Table,
    CreatedAt,
}

#[derive(Iden)]
enum ListingImages {
    Table,
    ListingId,
}
