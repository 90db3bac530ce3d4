//! Bounded HTTP fetcher for preview pages.
//!
//! Every limit is enforced, not advisory:
//! - one wall-clock timeout covering all redirect hops and the body
//! - a maximum number of redirect hops, each re-checked by the host guard
//! - a hard cap on decoded body bytes, enforced while streaming
//! - only `200 OK` with a `text/html` content type is accepted

mod response;
mod user_agent;

pub use response::{is_html_content_type, HtmlContent};
pub use user_agent::{resolve_user_agent, USER_AGENT};

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::redirect::Policy;
use reqwest::{Client, Response, StatusCode};
use thiserror::Error;
use tracing::{debug, warn};
use url::Url;

use crate::preview::guard;
use response::{content_length, content_type, is_redirect, location};

/// Default wall-clock timeout for a whole fetch.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);
/// Default maximum number of redirect hops.
pub const DEFAULT_MAX_REDIRECTS: u32 = 3;
/// Default body size cap (512 KiB).
pub const DEFAULT_MAX_BYTES: usize = 512 * 1024;

/// Limits applied to every fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchLimits {
    pub timeout: Duration,
    pub max_redirects: u32,
    pub max_bytes: usize,
}

impl Default for FetchLimits {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            max_redirects: DEFAULT_MAX_REDIRECTS,
            max_bytes: DEFAULT_MAX_BYTES,
        }
    }
}

/// Coarse category of a fetch failure, for callers that branch on cause.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchErrorKind {
    Timeout,
    TooManyRedirects,
    TooLarge,
    BadStatus,
    BadContentType,
    InvalidRedirect,
    ForbiddenRedirect,
    InvalidUrl,
    Network,
}

impl FetchErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FetchErrorKind::Timeout => "timeout",
            FetchErrorKind::TooManyRedirects => "too_many_redirects",
            FetchErrorKind::TooLarge => "too_large",
            FetchErrorKind::BadStatus => "bad_status",
            FetchErrorKind::BadContentType => "bad_content_type",
            FetchErrorKind::InvalidRedirect => "invalid_redirect",
            FetchErrorKind::ForbiddenRedirect => "forbidden_redirect",
            FetchErrorKind::InvalidUrl => "invalid_url",
            FetchErrorKind::Network => "network",
        }
    }
}

/// Errors that can occur while fetching a preview page.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    #[error("timeout of {0}ms exceeded")]
    Timeout(u64),

    #[error("Maximum number of redirects exceeded (max {0})")]
    TooManyRedirects(u32),

    #[error("Response size exceeded limit of {0} bytes")]
    TooLarge(usize),

    #[error("Request failed with status code {0}")]
    BadStatus(u16),

    #[error("Invalid content-type: {0}")]
    BadContentType(String),

    #[error("Invalid redirect location: {0}")]
    InvalidRedirect(String),

    #[error("Redirect points to private IP")]
    ForbiddenRedirect,

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Request failed: {0}")]
    Network(String),
}

impl FetchError {
    pub fn kind(&self) -> FetchErrorKind {
        match self {
            FetchError::Timeout(_) => FetchErrorKind::Timeout,
            FetchError::TooManyRedirects(_) => FetchErrorKind::TooManyRedirects,
            FetchError::TooLarge(_) => FetchErrorKind::TooLarge,
            FetchError::BadStatus(_) => FetchErrorKind::BadStatus,
            FetchError::BadContentType(_) => FetchErrorKind::BadContentType,
            FetchError::InvalidRedirect(_) => FetchErrorKind::InvalidRedirect,
            FetchError::ForbiddenRedirect => FetchErrorKind::ForbiddenRedirect,
            FetchError::InvalidUrl(_) => FetchErrorKind::InvalidUrl,
            FetchError::Network(_) => FetchErrorKind::Network,
        }
    }

    fn from_reqwest(e: reqwest::Error, limits: &FetchLimits) -> Self {
        if e.is_timeout() {
            FetchError::Timeout(limits.timeout.as_millis() as u64)
        } else {
            FetchError::Network(e.to_string())
        }
    }
}

/// Anything that can turn a URL into HTML for the preview pipeline.
#[async_trait]
pub trait HtmlFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<HtmlContent, FetchError>;
}

/// Predicate deciding whether a redirect target host must be refused.
pub type HostGuard = fn(&str) -> bool;

/// HTTP client that retrieves HTML under strict limits.
#[derive(Clone)]
pub struct BoundedFetcher {
    client: Client,
    limits: FetchLimits,
    user_agent: String,
    host_guard: HostGuard,
}

impl BoundedFetcher {
    /// Create a fetcher with the default user agent.
    pub fn new(limits: FetchLimits) -> Result<Self, reqwest::Error> {
        Self::with_user_agent(limits, None)
    }

    /// Create a fetcher with a custom user agent configuration.
    /// - None: Use default Centscape user agent
    /// - Some(custom): Use custom user agent string
    pub fn with_user_agent(
        limits: FetchLimits,
        user_agent_config: Option<&str>,
    ) -> Result<Self, reqwest::Error> {
        let user_agent = resolve_user_agent(user_agent_config);
        // Redirects are followed by hand so every hop is counted and guarded.
        let client = Client::builder()
            .user_agent(&user_agent)
            .redirect(Policy::none())
            .timeout(limits.timeout)
            .connect_timeout(limits.timeout)
            .gzip(true)
            .brotli(true)
            .build()?;

        Ok(Self {
            client,
            limits,
            user_agent,
            host_guard: guard::is_forbidden,
        })
    }

    /// Replace the redirect host check. Only loopback test servers need this.
    pub fn with_host_guard(mut self, host_guard: HostGuard) -> Self {
        self.host_guard = host_guard;
        self
    }

    pub fn limits(&self) -> &FetchLimits {
        &self.limits
    }

    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    /// Fetch a page, aborting the in-flight request once the timeout elapses.
    pub async fn fetch(&self, url: &str) -> Result<HtmlContent, FetchError> {
        let start = Instant::now();

        match tokio::time::timeout(self.limits.timeout, self.fetch_following_redirects(url)).await
        {
            Ok(Ok(page)) => {
                debug!(
                    "Fetched {} ({} bytes, {} redirects) in {:?}",
                    page.final_url,
                    page.len(),
                    page.redirects,
                    start.elapsed()
                );
                Ok(page)
            }
            Ok(Err(e)) => {
                warn!("Fetch of {} failed: {}", url, e);
                Err(e)
            }
            Err(_) => {
                warn!("Fetch of {} timed out after {:?}", url, self.limits.timeout);
                Err(FetchError::Timeout(self.limits.timeout.as_millis() as u64))
            }
        }
    }

    async fn fetch_following_redirects(&self, url: &str) -> Result<HtmlContent, FetchError> {
        let mut current = Url::parse(url).map_err(|e| FetchError::InvalidUrl(e.to_string()))?;
        let mut redirects = 0u32;

        loop {
            let response = self
                .client
                .get(current.clone())
                .send()
                .await
                .map_err(|e| FetchError::from_reqwest(e, &self.limits))?;
            let status = response.status();

            if is_redirect(status) {
                redirects += 1;
                if redirects > self.limits.max_redirects {
                    return Err(FetchError::TooManyRedirects(self.limits.max_redirects));
                }

                let next = redirect_target(&current, &response, self.host_guard)?;
                debug!("Redirect {} -> {} (hop {})", current, next, redirects);
                current = next;
                continue;
            }

            if status != StatusCode::OK {
                return Err(FetchError::BadStatus(status.as_u16()));
            }

            let content_type = content_type(&response).unwrap_or_default().to_string();
            if !is_html_content_type(&content_type) {
                return Err(FetchError::BadContentType(if content_type.is_empty() {
                    "missing".to_string()
                } else {
                    content_type
                }));
            }

            if let Some(len) = content_length(&response) {
                if len > self.limits.max_bytes as u64 {
                    return Err(FetchError::TooLarge(self.limits.max_bytes));
                }
            }

            let bytes = self.read_body_limited(response).await?;

            return Ok(HtmlContent {
                final_url: current.to_string(),
                content_type,
                redirects,
                body: String::from_utf8_lossy(&bytes).into_owned(),
            });
        }
    }

    /// Read a response body in chunks, failing the moment the cap is exceeded.
    async fn read_body_limited(&self, mut response: Response) -> Result<Vec<u8>, FetchError> {
        let max_bytes = self.limits.max_bytes;
        let mut body = Vec::new();

        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| FetchError::from_reqwest(e, &self.limits))?
        {
            if body.len() + chunk.len() > max_bytes {
                return Err(FetchError::TooLarge(max_bytes));
            }
            body.extend_from_slice(&chunk);
        }

        Ok(body)
    }
}

#[async_trait]
impl HtmlFetcher for BoundedFetcher {
    async fn fetch(&self, url: &str) -> Result<HtmlContent, FetchError> {
        BoundedFetcher::fetch(self, url).await
    }
}

/// Resolve and vet the Location of a redirect response.
fn redirect_target(
    current: &Url,
    response: &Response,
    is_forbidden: HostGuard,
) -> Result<Url, FetchError> {
    let location = location(response)
        .ok_or_else(|| FetchError::InvalidRedirect("missing Location header".to_string()))?;

    let next = current
        .join(location)
        .map_err(|_| FetchError::InvalidRedirect(location.to_string()))?;

    if !matches!(next.scheme(), "http" | "https") {
        return Err(FetchError::InvalidRedirect(location.to_string()));
    }

    match next.host_str() {
        Some(host) if !is_forbidden(host) => Ok(next),
        Some(host) => {
            warn!("Refusing redirect to forbidden host {}", host);
            Err(FetchError::ForbiddenRedirect)
        }
        None => Err(FetchError::InvalidRedirect(location.to_string())),
    }
}
