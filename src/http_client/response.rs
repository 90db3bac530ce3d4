//! Fetched page wrapper and response header helpers.

use reqwest::header::{CONTENT_LENGTH, CONTENT_TYPE, LOCATION};
use reqwest::{Response, StatusCode};

/// HTML retrieved by the bounded fetcher.
#[derive(Debug, Clone)]
pub struct HtmlContent {
    /// URL the body was finally served from, after redirects.
    pub final_url: String,
    /// Raw Content-Type header value.
    pub content_type: String,
    /// Number of redirect hops followed.
    pub redirects: u32,
    /// Decoded body text.
    pub body: String,
}

impl HtmlContent {
    /// Body size in bytes.
    pub fn len(&self) -> usize {
        self.body.len()
    }

    pub fn is_empty(&self) -> bool {
        self.body.is_empty()
    }
}

/// Check if the status is one the fetcher follows as a redirect.
pub fn is_redirect(status: StatusCode) -> bool {
    matches!(status.as_u16(), 301 | 302 | 303 | 307 | 308)
}

/// Get the Content-Type header.
pub fn content_type(response: &Response) -> Option<&str> {
    response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
}

/// Get the declared Content-Length header.
pub fn content_length(response: &Response) -> Option<u64> {
    response
        .headers()
        .get(CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.trim().parse().ok())
}

/// Get the Location header of a redirect.
pub fn location(response: &Response) -> Option<&str> {
    response
        .headers()
        .get(LOCATION)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

/// Check whether a Content-Type header value declares HTML.
pub fn is_html_content_type(value: &str) -> bool {
    value.to_ascii_lowercase().contains("text/html")
}
