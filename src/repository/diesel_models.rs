//! Diesel ORM models for database tables.

use diesel::prelude::*;

use crate::schema;

/// Wishlist record from the database.
#[derive(Queryable, Selectable, Identifiable, Debug, Clone)]
#[diesel(table_name = schema::wishlist)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct WishlistRecord {
    pub id: i32,
    pub title: String,
    pub image: String,
    pub price: String,
    pub currency: String,
    pub site_name: String,
    pub source_url: String,
    pub normalized_url: Option<String>,
    pub dedup_key: String,
    pub created_at: String,
}

/// New wishlist row for insertion.
#[derive(Insertable, Debug)]
#[diesel(table_name = schema::wishlist)]
pub struct NewWishlistRecord<'a> {
    pub title: &'a str,
    pub image: &'a str,
    pub price: &'a str,
    pub currency: &'a str,
    pub site_name: &'a str,
    pub source_url: &'a str,
    pub normalized_url: Option<&'a str>,
    pub dedup_key: &'a str,
    pub created_at: &'a str,
}
