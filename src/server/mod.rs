//! HTTP surface for link previews.
//!
//! Routes:
//! - `GET /` service info
//! - `POST /preview` run the preview pipeline for `{ url, raw_html? }`
//!
//! Every route sits behind the per-client rate limiter.

mod handlers;
mod rate_limit;
mod routes;

pub use routes::create_router;

use std::net::SocketAddr;
use std::sync::Arc;

use crate::config::Settings;
use crate::http_client::BoundedFetcher;
use crate::preview::PreviewService;
use crate::rate_limit::ClientRateLimiter;

/// Name reported by `GET /`.
pub const SERVICE_NAME: &str = "centscape-server";

/// Shared state for the web server.
#[derive(Clone)]
pub struct AppState {
    pub service: PreviewService,
    pub rate_limiter: ClientRateLimiter,
    /// Use the first `X-Forwarded-For` entry as client identity.
    pub trust_forwarded_for: bool,
}

impl AppState {
    pub fn new(
        service: PreviewService,
        rate_limiter: ClientRateLimiter,
        trust_forwarded_for: bool,
    ) -> Self {
        Self {
            service,
            rate_limiter,
            trust_forwarded_for,
        }
    }

    /// Build the production state: a bounded fetcher and a fresh limiter.
    pub fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        let fetcher =
            BoundedFetcher::with_user_agent(settings.fetch_limits(), Some(&settings.user_agent))?;
        tracing::debug!(
            "Preview fetcher using user agent {} with {:?}",
            fetcher.user_agent(),
            fetcher.limits()
        );

        Ok(Self::new(
            PreviewService::new(Arc::new(fetcher)),
            ClientRateLimiter::with_config(settings.rate_limit_config()),
            settings.trust_forwarded_for,
        ))
    }
}

/// Start the web server.
pub async fn serve(settings: &Settings, bind: &str) -> anyhow::Result<()> {
    let state = AppState::from_settings(settings)?;
    spawn_rate_limit_purge(state.rate_limiter.clone());

    let app = create_router(state);

    let addr: SocketAddr = bind.parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Starting server at http://{}", listener.local_addr()?);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}

/// Periodically drop expired rate limit windows so idle clients don't accumulate.
fn spawn_rate_limit_purge(limiter: ClientRateLimiter) {
    let period = limiter.config().window;
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        // First tick completes immediately.
        interval.tick().await;
        loop {
            interval.tick().await;
            limiter.purge_expired().await;
        }
    });
}
