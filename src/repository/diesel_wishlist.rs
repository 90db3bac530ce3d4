//! Diesel-based wishlist repository for SQLite.
//!
//! Uses diesel-async's SyncConnectionWrapper to provide an async interface
//! while maintaining Diesel's compile-time query checking.

use async_trait::async_trait;
use chrono::SecondsFormat;
use diesel::prelude::*;
use diesel_async::{RunQueryDsl, SimpleAsyncConnection};
use tracing::{debug, info};

use super::diesel_models::{NewWishlistRecord, WishlistRecord};
use super::diesel_pool::{AsyncSqlitePool, DieselError};
use super::{parse_datetime, WishlistStore};
use crate::models::{AddOutcome, NewWishlistItem, WishlistItem};
use crate::schema::{storage_meta, wishlist};

/// Current on-disk schema version, recorded in `storage_meta`.
pub const SCHEMA_VERSION: i32 = 1;

const SCHEMA_SQL: &str = r#"
PRAGMA journal_mode = WAL;

CREATE TABLE IF NOT EXISTS storage_meta (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS wishlist (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    title TEXT NOT NULL DEFAULT '',
    image TEXT NOT NULL DEFAULT '',
    price TEXT NOT NULL DEFAULT '',
    currency TEXT NOT NULL DEFAULT '',
    site_name TEXT NOT NULL DEFAULT '',
    source_url TEXT NOT NULL,
    normalized_url TEXT,
    dedup_key TEXT NOT NULL UNIQUE,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_wishlist_created_at ON wishlist(created_at);
"#;

impl From<WishlistRecord> for WishlistItem {
    fn from(record: WishlistRecord) -> Self {
        WishlistItem {
            id: record.id,
            title: record.title,
            image: record.image,
            price: record.price,
            currency: record.currency,
            site_name: record.site_name,
            source_url: record.source_url,
            normalized_url: record.normalized_url,
            created_at: parse_datetime(&record.created_at),
        }
    }
}

/// Diesel-based wishlist repository.
#[derive(Clone)]
pub struct DieselWishlistRepository {
    pool: AsyncSqlitePool,
}

impl DieselWishlistRepository {
    /// Create a new repository with an existing pool.
    pub fn new(pool: AsyncSqlitePool) -> Self {
        Self { pool }
    }

    /// Create tables if needed and record the schema version.
    pub async fn init_schema(&self) -> Result<(), DieselError> {
        let mut conn = self.pool.get().await?;
        conn.batch_execute(SCHEMA_SQL).await?;

        diesel::insert_into(storage_meta::table)
            .values((
                storage_meta::key.eq("schema_version"),
                storage_meta::value.eq(SCHEMA_VERSION.to_string()),
            ))
            .on_conflict(storage_meta::key)
            .do_nothing()
            .execute(&mut conn)
            .await?;

        Ok(())
    }

    /// Schema version recorded in the database, if initialised.
    pub async fn schema_version(&self) -> Result<Option<i32>, DieselError> {
        let mut conn = self.pool.get().await?;

        let value: Option<String> = storage_meta::table
            .filter(storage_meta::key.eq("schema_version"))
            .select(storage_meta::value)
            .first(&mut conn)
            .await
            .optional()?;

        Ok(value.and_then(|v| v.parse().ok()))
    }

    /// Add an item unless one with the same dedup key exists.
    ///
    /// The insert and the uniqueness check are one statement, so concurrent
    /// adds of the same key all resolve to the single committed row.
    pub async fn add(&self, item: &NewWishlistItem) -> Result<AddOutcome, DieselError> {
        let mut conn = self.pool.get().await?;

        let created_at = item.created_at.to_rfc3339_opts(SecondsFormat::Micros, true);
        let dedup_key = item.dedup_key();
        let record = NewWishlistRecord {
            title: &item.title,
            image: &item.image,
            price: &item.price,
            currency: &item.currency,
            site_name: &item.site_name,
            source_url: &item.source_url,
            normalized_url: item.normalized_url.as_deref(),
            dedup_key,
            created_at: &created_at,
        };

        let inserted = diesel::insert_into(wishlist::table)
            .values(&record)
            .on_conflict(wishlist::dedup_key)
            .do_nothing()
            .execute(&mut conn)
            .await?;

        let id: i32 = wishlist::table
            .filter(wishlist::dedup_key.eq(dedup_key))
            .select(wishlist::id)
            .first(&mut conn)
            .await?;

        if inserted > 0 {
            info!("Added wishlist item {} for {}", id, dedup_key);
        } else {
            debug!("Wishlist already has {} as item {}", dedup_key, id);
        }

        Ok(AddOutcome {
            id,
            created: inserted > 0,
        })
    }

    /// Get an item by ID.
    pub async fn get(&self, id: i32) -> Result<Option<WishlistItem>, DieselError> {
        let mut conn = self.pool.get().await?;

        wishlist::table
            .find(id)
            .select(WishlistRecord::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map(|opt| opt.map(WishlistItem::from))
    }

    /// All items, newest first.
    pub async fn list(&self) -> Result<Vec<WishlistItem>, DieselError> {
        let mut conn = self.pool.get().await?;

        wishlist::table
            .order((wishlist::created_at.desc(), wishlist::id.desc()))
            .select(WishlistRecord::as_select())
            .load(&mut conn)
            .await
            .map(|records| records.into_iter().map(WishlistItem::from).collect())
    }

    /// Delete an item. Returns whether a row was removed.
    pub async fn delete(&self, id: i32) -> Result<bool, DieselError> {
        let mut conn = self.pool.get().await?;

        let rows = diesel::delete(wishlist::table.find(id))
            .execute(&mut conn)
            .await?;

        Ok(rows > 0)
    }
}

#[async_trait]
impl WishlistStore for DieselWishlistRepository {
    async fn add(&self, item: &NewWishlistItem) -> Result<AddOutcome, DieselError> {
        DieselWishlistRepository::add(self, item).await
    }

    async fn list(&self) -> Result<Vec<WishlistItem>, DieselError> {
        DieselWishlistRepository::list(self).await
    }

    async fn delete(&self, id: i32) -> Result<bool, DieselError> {
        DieselWishlistRepository::delete(self, id).await
    }
}
