//! Centscape - link previews and a deduplicated wishlist.
//!
//! Fetches a page under strict limits, extracts title, image, price and
//! site name, and stores previews in a wishlist keyed by normalized URL.

pub mod cli;
pub mod config;
pub mod http_client;
pub mod models;
pub mod preview;
pub mod rate_limit;
pub mod repository;
pub mod schema;
pub mod server;
pub mod utils;
