use std::collections::HashMap;

use anyhow::Result;
use sea_orm::{
    ColumnTrait, Condition, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect,
};

use crate::entities::{listing_images, listings, prelude::*};
use crate::services::search::{ListingQuery, SortKey};

/// One catalog row together with its eagerly-fetched images.
#[derive(Debug, Clone)]
pub struct ListingWithImages {
    pub listing: listings::Model,
    pub images: Vec<listing_images::Model>,
}

#[derive(Debug)]
pub struct ListingPage {
    pub listings: Vec<ListingWithImages>,
    /// Cardinality of the full matching set, independent of the page window.
    pub total: u64,
}

/// Read-only accessor over the listings catalog. Every query here is a read;
/// catalog writes belong to the listing service, not this subsystem.
pub struct ListingRepository {
    conn: DatabaseConnection,
}

impl ListingRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Conjunctive filter over term/category/location. The term is a
    /// case-insensitive substring match on title or description (sqlite LIKE);
    /// category and location are exact matches.
    fn filter_condition(query: &ListingQuery) -> Condition {
        let mut cond = Condition::all();

        if let Some(term) = &query.term {
            cond = cond.add(
                Condition::any()
                    .add(listings::Column::Title.contains(term))
                    .add(listings::Column::Description.contains(term)),
            );
        }

        if let Some(category) = &query.category {
            cond = cond.add(listings::Column::Category.eq(category));
        }

        if let Some(location) = &query.location {
            cond = cond.add(listings::Column::Location.eq(location));
        }

        cond
    }

    pub async fn search(&self, query: &ListingQuery) -> Result<ListingPage> {
        let cond = Self::filter_condition(query);

        let total = Listings::find()
            .filter(cond.clone())
            .count(&self.conn)
            .await?;

        let mut find = Listings::find().filter(cond);

        find = match query.sort {
            SortKey::PriceLow => find.order_by_asc(listings::Column::Price),
            SortKey::PriceHigh => find.order_by_desc(listings::Column::Price),
            SortKey::Relevance => find.order_by_desc(listings::Column::CreatedAt),
        };

        // Id ascending as the final tie-break keeps every ordering total
        let rows = find
            .order_by_asc(listings::Column::Id)
            .offset(query.offset)
            .limit(query.limit)
            .all(&self.conn)
            .await?;

        let listings = self.attach_images(rows).await?;

        Ok(ListingPage { listings, total })
    }

    /// Bounded suggestion search over title, description, category, and
    /// location. Ordered by id ascending, capped at `limit` rows.
    pub async fn quick_match(&self, term: &str, limit: u64) -> Result<Vec<listings::Model>> {
        let cond = Condition::any()
            .add(listings::Column::Title.contains(term))
            .add(listings::Column::Description.contains(term))
            .add(listings::Column::Category.contains(term))
            .add(listings::Column::Location.contains(term));

        let rows = Listings::find()
            .filter(cond)
            .order_by_asc(listings::Column::Id)
            .limit(limit)
            .all(&self.conn)
            .await?;

        Ok(rows)
    }

    pub async fn count(&self) -> Result<u64> {
        Ok(Listings::find().count(&self.conn).await?)
    }

    /// One batched secondary query for all images of the page, never a
    /// per-listing round trip.
    async fn attach_images(&self, rows: Vec<listings::Model>) -> Result<Vec<ListingWithImages>> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<i64> = rows.iter().map(|l| l.id).collect();

        let images = ListingImages::find()
            .filter(listing_images::Column::ListingId.is_in(ids))
            .order_by_asc(listing_images::Column::Id)
            .all(&self.conn)
            .await?;

        let mut by_listing: HashMap<i64, Vec<listing_images::Model>> = HashMap::new();
        for image in images {
            by_listing.entry(image.listing_id).or_default().push(image);
        }

        Ok(rows
            .into_iter()
            .map(|listing| {
                let images = by_listing.remove(&listing.id).unwrap_or_default();
                ListingWithImages { listing, images }
            })
            .collect())
    }
}
