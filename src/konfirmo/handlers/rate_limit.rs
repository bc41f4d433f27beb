//! Fixed-window request limiter applied in front of every route.
//!
//! The production policy is fixed: 100 requests per client per 15-minute
//! window. The client key comes from proxy headers, falling back to a
//! shared bucket for direct connections.

use axum::{
    extract::{Extension, Request},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use super::extract_client_ip;
use crate::otp::now_millis;

pub const MAX_REQUESTS: u32 = 100;
pub const WINDOW: Duration = Duration::from_secs(15 * 60);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RateLimitDecision {
    Allowed,
    Limited,
}

#[derive(Debug)]
struct Window {
    started_at: u64,
    count: u32,
}

/// Per-client fixed-window counters.
#[derive(Debug)]
pub struct FixedWindowLimiter {
    windows: Mutex<HashMap<String, Window>>,
    window_ms: u64,
    max_requests: u32,
}

impl Default for FixedWindowLimiter {
    fn default() -> Self {
        Self::new()
    }
}

impl FixedWindowLimiter {
    #[must_use]
    pub fn new() -> Self {
        Self::with_limits(MAX_REQUESTS, WINDOW)
    }

    /// Custom limits, for tests.
    #[must_use]
    pub fn with_limits(max_requests: u32, window: Duration) -> Self {
        Self {
            windows: Mutex::new(HashMap::new()),
            window_ms: window.as_millis() as u64,
            max_requests,
        }
    }

    pub fn check(&self, client: &str, now: u64) -> RateLimitDecision {
        let mut windows = self
            .windows
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        // Drop every lapsed bucket, not just the caller's, so idle
        // clients do not accumulate for the process lifetime
        windows.retain(|_, window| now.saturating_sub(window.started_at) < self.window_ms);

        let window = windows.entry(client.to_string()).or_insert(Window {
            started_at: now,
            count: 0,
        });

        if window.count >= self.max_requests {
            return RateLimitDecision::Limited;
        }

        window.count += 1;

        RateLimitDecision::Allowed
    }

    #[cfg(test)]
    fn tracked_clients(&self) -> usize {
        self.windows
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

/// axum middleware enforcing the limiter.
pub async fn rate_limit(
    Extension(limiter): Extension<Arc<FixedWindowLimiter>>,
    request: Request,
    next: Next,
) -> Response {
    let client =
        extract_client_ip(request.headers()).unwrap_or_else(|| "unknown".to_string());

    if limiter.check(&client, now_millis()) == RateLimitDecision::Limited {
        return (
            StatusCode::TOO_MANY_REQUESTS,
            "Rate limited".to_string(),
        )
            .into_response();
    }

    next.run(request).await
}
