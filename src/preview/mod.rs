//! Link preview pipeline: guard, fetch, extract.

pub mod extract;
pub mod guard;
mod service;

use serde::{Deserialize, Serialize};

pub use extract::extract;
pub use guard::is_forbidden;
pub use service::{PreviewService, RequestError};

/// Title used when a page offers nothing better.
pub const NO_TITLE: &str = "No Title";

/// Input to the preview pipeline.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreviewRequest {
    #[serde(default)]
    pub url: Option<String>,
    /// Caller-supplied HTML; when present no fetch is performed.
    #[serde(default, alias = "rawContent")]
    pub raw_html: Option<String>,
}

impl PreviewRequest {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            raw_html: None,
        }
    }

    pub fn with_raw_html(mut self, html: impl Into<String>) -> Self {
        self.raw_html = Some(html.into());
        self
    }
}

/// Extracted preview. Every field is always populated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewResult {
    pub title: String,
    pub image: String,
    pub price: String,
    pub currency: String,
    pub site_name: String,
    pub source_url: String,
}

impl PreviewResult {
    /// Result for a page with no usable metadata.
    pub fn empty(source_url: &str) -> Self {
        Self {
            title: NO_TITLE.to_string(),
            image: String::new(),
            price: String::new(),
            currency: String::new(),
            site_name: String::new(),
            source_url: source_url.to_string(),
        }
    }
}
