//! Per-client request rate limiting.
//!
//! Fixed-window counter keyed by client identity. Each client may make
//! `max_requests` requests per window; later requests in the same window
//! are rejected rather than queued.

mod window;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::Mutex;
use tracing::{debug, warn};

pub use window::ClientWindow;

/// Default number of requests allowed per window.
pub const DEFAULT_MAX_REQUESTS: u32 = 10;
/// Default window length.
pub const DEFAULT_WINDOW: Duration = Duration::from_secs(60);

/// Rate limit configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitConfig {
    pub max_requests: u32,
    pub window: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: DEFAULT_MAX_REQUESTS,
            window: DEFAULT_WINDOW,
        }
    }
}

/// Outcome of a rate limit check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimitDecision {
    Allowed { limit: u32, remaining: u32 },
    Limited { limit: u32, retry_after: Duration },
}

impl RateLimitDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, RateLimitDecision::Allowed { .. })
    }
}

/// Snapshot of one client's window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientStats {
    pub count: u32,
    pub rejected: u64,
    pub resets_in: Duration,
}

/// Fixed-window rate limiter shared by all request handlers.
#[derive(Debug, Clone)]
pub struct ClientRateLimiter {
    config: RateLimitConfig,
    clients: Arc<Mutex<HashMap<String, ClientWindow>>>,
}

impl ClientRateLimiter {
    /// Create a new rate limiter with default config.
    pub fn new() -> Self {
        Self::with_config(RateLimitConfig::default())
    }

    /// Create a new rate limiter with custom config.
    pub fn with_config(config: RateLimitConfig) -> Self {
        Self {
            config,
            clients: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn config(&self) -> &RateLimitConfig {
        &self.config
    }

    /// Count a request from `client` and decide whether it may proceed.
    pub async fn check(&self, client: &str) -> RateLimitDecision {
        self.check_at(client, Instant::now()).await
    }

    pub(crate) async fn check_at(&self, client: &str, now: Instant) -> RateLimitDecision {
        let limit = self.config.max_requests;
        let mut clients = self.clients.lock().await;
        let state = clients
            .entry(client.to_string())
            .or_insert_with(|| ClientWindow::new(now));
        state.roll(now, self.config.window);

        if state.count < limit {
            state.count += 1;
            RateLimitDecision::Allowed {
                limit,
                remaining: limit - state.count,
            }
        } else {
            state.rejected += 1;
            let retry_after = state.time_until_reset(now, self.config.window);
            if state.rejected == 1 {
                warn!(
                    "Rate limit reached for {} ({} requests in {:?})",
                    client, limit, self.config.window
                );
            }
            RateLimitDecision::Limited { limit, retry_after }
        }
    }

    /// Drop windows that have expired. Returns the number removed.
    pub async fn purge_expired(&self) -> usize {
        self.purge_expired_at(Instant::now()).await
    }

    pub(crate) async fn purge_expired_at(&self, now: Instant) -> usize {
        let window = self.config.window;
        let mut clients = self.clients.lock().await;
        let before = clients.len();
        clients.retain(|_, state| !state.is_expired(now, window));
        let removed = before - clients.len();
        if removed > 0 {
            debug!("Purged {} expired rate limit windows", removed);
        }
        removed
    }

    /// Get statistics for a client's current window.
    pub async fn client_stats(&self, client: &str) -> Option<ClientStats> {
        let now = Instant::now();
        let clients = self.clients.lock().await;
        clients.get(client).map(|state| ClientStats {
            count: state.count,
            rejected: state.rejected,
            resets_in: state.time_until_reset(now, self.config.window),
        })
    }
}

impl Default for ClientRateLimiter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_eleventh_request_rejected() {
        let limiter = ClientRateLimiter::new();
        for i in 0..10 {
            let decision = limiter.check("203.0.113.7").await;
            assert_eq!(
                decision,
                RateLimitDecision::Allowed {
                    limit: 10,
                    remaining: 9 - i
                }
            );
        }

        let decision = limiter.check("203.0.113.7").await;
        match decision {
            RateLimitDecision::Limited { limit, retry_after } => {
                assert_eq!(limit, 10);
                assert!(retry_after <= Duration::from_secs(60));
                assert!(retry_after > Duration::from_secs(50));
            }
            other => panic!("expected limited, got {:?}", other),
        }

        let stats = limiter.client_stats("203.0.113.7").await.unwrap();
        assert_eq!(stats.count, 10);
        assert_eq!(stats.rejected, 1);
    }

    #[tokio::test]
    async fn test_clients_are_independent() {
        let limiter = ClientRateLimiter::with_config(RateLimitConfig {
            max_requests: 2,
            window: Duration::from_secs(60),
        });
        assert!(limiter.check("a").await.is_allowed());
        assert!(limiter.check("a").await.is_allowed());
        assert!(!limiter.check("a").await.is_allowed());
        assert!(limiter.check("b").await.is_allowed());
        assert_eq!(limiter.client_stats("a").await.unwrap().rejected, 1);
        assert_eq!(limiter.client_stats("b").await.unwrap().count, 1);
    }

    #[tokio::test]
    async fn test_window_resets() {
        let limiter = ClientRateLimiter::with_config(RateLimitConfig {
            max_requests: 1,
            window: Duration::from_secs(60),
        });
        let start = Instant::now();
        assert!(limiter.check_at("c", start).await.is_allowed());
        assert!(!limiter
            .check_at("c", start + Duration::from_secs(30))
            .await
            .is_allowed());
        assert!(limiter
            .check_at("c", start + Duration::from_secs(61))
            .await
            .is_allowed());
    }

    #[tokio::test]
    async fn test_purge_expired() {
        let limiter = ClientRateLimiter::new();
        let start = Instant::now();
        limiter.check_at("old", start).await;
        limiter
            .check_at("new", start + Duration::from_secs(30))
            .await;

        let removed = limiter
            .purge_expired_at(start + Duration::from_secs(70))
            .await;
        assert_eq!(removed, 1);
        assert!(limiter.client_stats("old").await.is_none());
        assert!(limiter.client_stats("new").await.is_some());
    }

    #[tokio::test]
    async fn test_concurrent_checks_admit_exactly_limit() {
        let limiter = ClientRateLimiter::new();
        let mut handles = Vec::new();
        for _ in 0..25 {
            let limiter = limiter.clone();
            handles.push(tokio::spawn(async move { limiter.check("shared").await }));
        }

        let mut allowed = 0;
        for handle in handles {
            if handle.await.unwrap().is_allowed() {
                allowed += 1;
            }
        }
        assert_eq!(allowed, 10);
    }
}
