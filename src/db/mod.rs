pub mod auth;
pub mod connection;
pub mod contacts;
pub mod favorites;

pub use connection::Database;
