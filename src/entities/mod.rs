pub mod prelude;

pub mod listing_images;
pub mod listings;
pub mod search_events;
