//! Data models for Centscape.

mod wishlist;

pub use wishlist::{AddOutcome, NewWishlistItem, WishlistItem};
