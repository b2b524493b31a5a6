pub mod event;
pub mod listing;
