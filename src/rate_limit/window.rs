//! Per-client fixed-window state.

use std::time::{Duration, Instant};

/// Request count for one client within the current window.
#[derive(Debug, Clone)]
pub struct ClientWindow {
    /// When the current window opened.
    pub started: Instant,
    /// Requests admitted in the current window.
    pub count: u32,
    /// Requests rejected in the current window.
    pub rejected: u64,
}

impl ClientWindow {
    pub fn new(now: Instant) -> Self {
        Self {
            started: now,
            count: 0,
            rejected: 0,
        }
    }

    /// Whether the window has run its full length.
    pub fn is_expired(&self, now: Instant, window: Duration) -> bool {
        now.saturating_duration_since(self.started) >= window
    }

    /// Start a fresh window if the current one has run out.
    pub fn roll(&mut self, now: Instant, window: Duration) {
        if self.is_expired(now, window) {
            *self = Self::new(now);
        }
    }

    /// Time until the current window closes.
    pub fn time_until_reset(&self, now: Instant, window: Duration) -> Duration {
        window.saturating_sub(now.saturating_duration_since(self.started))
    }
}
