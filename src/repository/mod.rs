//! Repository layer for database persistence.
//!
//! All database access uses Diesel ORM with compile-time query checking
//! against SQLite.

pub mod diesel_models;
pub mod diesel_pool;
pub mod diesel_wishlist;
pub mod util;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::models::{AddOutcome, NewWishlistItem, WishlistItem};

pub use diesel_pool::{AsyncSqlitePool, DieselError};
pub use diesel_wishlist::DieselWishlistRepository;

/// Persistent wishlist with at most one item per dedup key.
#[async_trait]
pub trait WishlistStore: Send + Sync {
    /// Add an item, or return the id of the equivalent item already stored.
    async fn add(&self, item: &NewWishlistItem) -> Result<AddOutcome, DieselError>;

    async fn list(&self) -> Result<Vec<WishlistItem>, DieselError>;

    /// Returns false when no item had that id.
    async fn delete(&self, id: i32) -> Result<bool, DieselError>;
}

/// Parse a datetime string from the database, defaulting to Unix epoch on error.
pub fn parse_datetime(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or(DateTime::UNIX_EPOCH)
}
