//! Token persistence

pub mod token_store;

pub use token_store::SqliteTokenStore;
