//! Request orchestration for previews.
//!
//! A request moves through validation, the host guard, an optional fetch,
//! and extraction. Any failure ends the request; nothing is retried.

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, warn};
use url::Url;

use super::{extract, guard, PreviewRequest, PreviewResult};
use crate::http_client::{FetchError, FetchErrorKind, HtmlFetcher};

/// Errors returned for a preview request. All of them are client errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RequestError {
    #[error("URL is required")]
    MissingUrl,

    #[error("Invalid URL")]
    InvalidUrl,

    /// Deliberately generic: does not reveal which range matched.
    #[error("URL points to private IP")]
    ForbiddenHost,

    #[error("{0}")]
    FetchFailed(#[from] FetchError),
}

impl RequestError {
    /// The underlying fetch failure, if that is what ended the request.
    pub fn fetch_error(&self) -> Option<&FetchError> {
        match self {
            RequestError::FetchFailed(e) => Some(e),
            _ => None,
        }
    }

    pub fn fetch_kind(&self) -> Option<FetchErrorKind> {
        self.fetch_error().map(FetchError::kind)
    }
}

/// Runs the guard, fetch and extract stages for each request.
#[derive(Clone)]
pub struct PreviewService {
    fetcher: Arc<dyn HtmlFetcher>,
}

impl PreviewService {
    pub fn new(fetcher: Arc<dyn HtmlFetcher>) -> Self {
        Self { fetcher }
    }

    /// Handle one preview request.
    pub async fn handle(&self, request: &PreviewRequest) -> Result<PreviewResult, RequestError> {
        let raw_url = request
            .url
            .as_deref()
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .ok_or(RequestError::MissingUrl)?;

        let url = parse_web_url(raw_url)?;
        let host = url.host_str().ok_or(RequestError::InvalidUrl)?;

        if guard::is_forbidden(host) {
            warn!("Rejected preview for forbidden host {}", host);
            return Err(RequestError::ForbiddenHost);
        }

        let html = match request.raw_html.as_deref() {
            Some(html) if !html.is_empty() => {
                debug!("Using caller-supplied HTML for {} ({} bytes)", raw_url, html.len());
                html.to_string()
            }
            _ => self.fetcher.fetch(url.as_str()).await?.body,
        };

        Ok(extract(&html, raw_url))
    }
}

/// Parse a URL that can be fetched over HTTP(S).
fn parse_web_url(raw: &str) -> Result<Url, RequestError> {
    let url = Url::parse(raw).map_err(|_| RequestError::InvalidUrl)?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        _ => Err(RequestError::InvalidUrl),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http_client::HtmlContent;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct StubFetcher {
        result: Result<String, FetchError>,
        calls: AtomicUsize,
    }

    impl StubFetcher {
        fn ok(body: &str) -> Arc<Self> {
            Arc::new(Self {
                result: Ok(body.to_string()),
                calls: AtomicUsize::new(0),
            })
        }

        fn failing(error: FetchError) -> Arc<Self> {
            Arc::new(Self {
                result: Err(error),
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl HtmlFetcher for StubFetcher {
        async fn fetch(&self, url: &str) -> Result<HtmlContent, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.result.clone().map(|body| HtmlContent {
                final_url: url.to_string(),
                content_type: "text/html".to_string(),
                redirects: 0,
                body,
            })
        }
    }

    #[tokio::test]
    async fn test_missing_url() {
        let service = PreviewService::new(StubFetcher::ok(""));
        let err = service.handle(&PreviewRequest::default()).await.unwrap_err();
        assert_eq!(err, RequestError::MissingUrl);
        assert_eq!(err.to_string(), "URL is required");

        let err = service.handle(&PreviewRequest::new("")).await.unwrap_err();
        assert_eq!(err, RequestError::MissingUrl);
    }

    #[tokio::test]
    async fn test_invalid_url() {
        let service = PreviewService::new(StubFetcher::ok(""));
        for url in ["not-a-url", "ftp://example.com/file", "mailto:someone@example.com"] {
            let err = service.handle(&PreviewRequest::new(url)).await.unwrap_err();
            assert_eq!(err, RequestError::InvalidUrl, "{}", url);
        }
    }

    #[tokio::test]
    async fn test_forbidden_hosts_never_fetched() {
        let fetcher = StubFetcher::ok("<title>secret</title>");
        let service = PreviewService::new(fetcher.clone());
        for url in [
            "http://192.168.1.1/test",
            "http://localhost:8080/test",
            "http://[::1]/",
            "http://169.254.169.254/latest/meta-data",
        ] {
            let err = service.handle(&PreviewRequest::new(url)).await.unwrap_err();
            assert_eq!(err.to_string(), "URL points to private IP", "{}", url);
        }
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_raw_html_bypasses_fetch() {
        let fetcher = StubFetcher::failing(FetchError::BadStatus(500));
        let service = PreviewService::new(fetcher.clone());
        let request = PreviewRequest::new("https://httpbin.org/json").with_raw_html(r#"{"test": "json"}"#);

        let result = service.handle(&request).await.unwrap();
        assert_eq!(result.title, "No Title");
        assert_eq!(result.source_url, "https://httpbin.org/json");
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_fetched_html_is_extracted() {
        let fetcher = StubFetcher::ok("<title>Fetched</title><p>INR 499</p>");
        let service = PreviewService::new(fetcher.clone());

        let result = service
            .handle(&PreviewRequest::new("https://shop.example.com/item"))
            .await
            .unwrap();
        assert_eq!(result.title, "Fetched");
        assert_eq!(result.price, "INR 499");
        assert_eq!(result.currency, "INR");
        assert_eq!(result.site_name, "shop.example.com");
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_fetch_failures_keep_their_reason() {
        let cases = [
            (FetchError::Timeout(5000), FetchErrorKind::Timeout, "timeout"),
            (FetchError::TooLarge(524_288), FetchErrorKind::TooLarge, "size"),
            (FetchError::TooManyRedirects(3), FetchErrorKind::TooManyRedirects, "redirects"),
            (FetchError::BadStatus(503), FetchErrorKind::BadStatus, "503"),
            (
                FetchError::BadContentType("application/json".into()),
                FetchErrorKind::BadContentType,
                "content-type",
            ),
        ];

        for (error, kind, needle) in cases {
            let service = PreviewService::new(StubFetcher::failing(error));
            let err = service
                .handle(&PreviewRequest::new("https://example.com/"))
                .await
                .unwrap_err();
            assert_eq!(err.fetch_kind(), Some(kind));
            assert!(err.to_string().contains(needle), "{}", err);
        }
    }
}
