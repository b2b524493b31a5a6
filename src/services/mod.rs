pub mod event_log;
pub mod insights;
pub mod search;

pub use event_log::{EventLogError, EventLogService, LogSearchInput};
pub use insights::{InsightsService, InsightsSnapshot, TermCount};
pub use search::{ListingQuery, ListingSearchParams, SearchService, SortKey};
