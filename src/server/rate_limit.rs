//! Rate limiting middleware.

use std::net::SocketAddr;

use axum::{
    extract::{ConnectInfo, Request, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};

use super::AppState;
use crate::rate_limit::RateLimitDecision;

const LIMIT_HEADER: &str = "x-ratelimit-limit";
const REMAINING_HEADER: &str = "x-ratelimit-remaining";

/// Count the request against its client and reject it once the window is full.
pub async fn enforce(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let client = client_identity(&request, state.trust_forwarded_for);

    match state.rate_limiter.check(&client).await {
        RateLimitDecision::Allowed { limit, remaining } => {
            let mut response = next.run(request).await;
            set_limit_headers(response.headers_mut(), limit, remaining);
            response
        }
        RateLimitDecision::Limited { limit, retry_after } => {
            // Round up so clients never retry before the window resets.
            let seconds = retry_after.as_millis().div_ceil(1000).max(1) as u64;
            let mut response = (
                StatusCode::TOO_MANY_REQUESTS,
                [(header::RETRY_AFTER, seconds.to_string())],
                Json(serde_json::json!({
                    "error": format!("Rate limit exceeded, retry in {} seconds", seconds)
                })),
            )
                .into_response();
            set_limit_headers(response.headers_mut(), limit, 0);
            response
        }
    }
}

fn set_limit_headers(headers: &mut HeaderMap, limit: u32, remaining: u32) {
    headers.insert(LIMIT_HEADER, HeaderValue::from(limit));
    headers.insert(REMAINING_HEADER, HeaderValue::from(remaining));
}

/// Identity a request is counted under.
///
/// The first `X-Forwarded-For` entry when trusted, else the peer IP.
pub fn client_identity(request: &Request, trust_forwarded_for: bool) -> String {
    if trust_forwarded_for {
        let forwarded = request
            .headers()
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .map(str::trim)
            .filter(|v| !v.is_empty());
        if let Some(client) = forwarded {
            return client.to_string();
        }
    }

    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}
