pub use super::listing_images::Entity as ListingImages;
pub use super::listings::Entity as Listings;
pub use super::search_events::Entity as SearchEvents;
