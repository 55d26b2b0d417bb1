//! Rate limiting middleware.
//!
//! Fixed-window limiter per client IP: 100 requests per 15 minutes,
//! matching what the API has always advertised to clients.

use axum::{
    extract::{ConnectInfo, Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::warn;

const LIMIT_MESSAGE: &str = "Too many requests from this IP, please try again after 15 minutes";

#[derive(Clone)]
pub struct RateLimiter {
    max_requests: u32,
    window: Duration,
    windows: Arc<Mutex<HashMap<IpAddr, Window>>>,
}

struct Window {
    count: u32,
    started: Instant,
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(100, Duration::from_secs(15 * 60))
    }
}

impl RateLimiter {
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            windows: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Count a request against the caller's window. Returns the seconds
    /// until reset when the caller is over the limit.
    fn hit(&self, ip: IpAddr) -> Option<u64> {
        let mut windows = self.windows.lock();
        let now = Instant::now();

        let window = windows.entry(ip).or_insert(Window {
            count: 0,
            started: now,
        });

        if now.duration_since(window.started) >= self.window {
            window.count = 0;
            window.started = now;
        }

        window.count += 1;
        if window.count > self.max_requests {
            let reset_at = window.started + self.window;
            Some(reset_at.saturating_duration_since(now).as_secs())
        } else {
            None
        }
    }

    /// Drop windows that have been idle past expiry. Run from a background
    /// task so the map does not grow with one entry per IP ever seen.
    pub fn sweep(&self) {
        let mut windows = self.windows.lock();
        let now = Instant::now();
        let window = self.window;
        windows.retain(|_, w| now.duration_since(w.started) < window);
    }
}

/// Middleware rejecting callers over their per-IP allowance with 429.
/// Only `/api/` routes count toward the window; health probes and other
/// infrastructure paths pass through uncounted.
pub async fn rate_limit(
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    State(limiter): State<RateLimiter>,
    request: Request,
    next: Next,
) -> Response {
    if !request.uri().path().starts_with("/api/") {
        return next.run(request).await;
    }

    match limiter.hit(addr.ip()) {
        None => next.run(request).await,
        Some(retry_after_secs) => {
            warn!(ip = %addr.ip(), retry_after_secs, "rate limit exceeded");

            (
                StatusCode::TOO_MANY_REQUESTS,
                [("Retry-After", retry_after_secs.to_string())],
                Json(serde_json::json!({
                    "success": false,
                    "error": LIMIT_MESSAGE,
                })),
            )
                .into_response()
        }
    }
}
