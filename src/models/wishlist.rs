//! Wishlist item models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::preview::PreviewResult;
use crate::utils::normalize_url;

/// A saved wishlist item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WishlistItem {
    pub id: i32,
    pub title: String,
    pub image: String,
    pub price: String,
    pub currency: String,
    pub site_name: String,
    pub source_url: String,
    /// Canonical form of `source_url`; None when it could not be parsed.
    pub normalized_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// An item about to be added to the wishlist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewWishlistItem {
    pub title: String,
    pub image: String,
    pub price: String,
    pub currency: String,
    pub site_name: String,
    pub source_url: String,
    pub normalized_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl NewWishlistItem {
    /// Build an item from a preview, normalizing its source URL.
    pub fn from_preview(preview: &PreviewResult) -> Self {
        Self {
            title: preview.title.clone(),
            image: preview.image.clone(),
            price: preview.price.clone(),
            currency: preview.currency.clone(),
            site_name: preview.site_name.clone(),
            source_url: preview.source_url.clone(),
            normalized_url: normalize_url(&preview.source_url),
            created_at: Utc::now(),
        }
    }

    /// Key two items must share to be considered duplicates.
    ///
    /// Falls back to the raw source URL when normalization failed.
    pub fn dedup_key(&self) -> &str {
        self.normalized_url.as_deref().unwrap_or(&self.source_url)
    }
}

/// Result of adding an item to the wishlist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AddOutcome {
    pub id: i32,
    /// False when an equivalent item already existed.
    pub created: bool,
}
