pub mod catalog;
pub mod extract;
pub mod listing;
pub mod query;
