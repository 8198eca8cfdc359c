//! API rate limiting middleware.
//!
//! Provides per-user and per-IP rate limiting. Each endpoint category keeps
//! its own window, so a burst of sign-in attempts does not eat into the
//! budget for browsing.

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use terapie_db::entities::user;
use tokio::sync::RwLock;

/// Rate limit configuration for an endpoint category.
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    /// Category name, part of the bucket key.
    pub scope: &'static str,
    /// Maximum requests per window.
    pub max_requests: u32,
    /// Time window duration in seconds.
    pub window_secs: u64,
}

impl RateLimitConfig {
    /// Create a new rate limit config.
    #[must_use]
    pub const fn new(scope: &'static str, max_requests: u32, window_secs: u64) -> Self {
        Self {
            scope,
            max_requests,
            window_secs,
        }
    }
}

/// Default rate limits for different endpoint categories.
pub mod limits {
    use super::RateLimitConfig;

    /// Standard API endpoints.
    pub const STANDARD: RateLimitConfig = RateLimitConfig::new("standard", 300, 60);

    /// Sign-in, sign-up and password reset.
    pub const AUTH: RateLimitConfig = RateLimitConfig::new("auth", 10, 300);

    /// Public forms: contact and provider applications.
    pub const FORM: RateLimitConfig = RateLimitConfig::new("form", 5, 600);

    /// File uploads.
    pub const UPLOAD: RateLimitConfig = RateLimitConfig::new("upload", 20, 60);
}

/// Rate limit state for a single key.
#[derive(Debug, Clone)]
struct RateLimitState {
    count: u32,
    window_start: Instant,
}

impl RateLimitState {
    fn new() -> Self {
        Self {
            count: 0,
            window_start: Instant::now(),
        }
    }
}

/// Fixed-window rate limiter.
#[derive(Clone, Default)]
pub struct ApiRateLimiter {
    /// State per key (scope plus user ID or IP address).
    states: Arc<RwLock<HashMap<String, RateLimitState>>>,
}

impl ApiRateLimiter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if a request is allowed and record it.
    pub async fn check(&self, key: &str, config: &RateLimitConfig) -> RateLimitResult {
        let mut states = self.states.write().await;
        let now = Instant::now();
        let window = Duration::from_secs(config.window_secs);

        let state = states
            .entry(format!("{}:{key}", config.scope))
            .or_insert_with(RateLimitState::new);

        if now.duration_since(state.window_start) >= window {
            state.count = 0;
            state.window_start = now;
        }

        let reset = window
            .saturating_sub(now.duration_since(state.window_start))
            .as_secs();

        if state.count >= config.max_requests {
            return RateLimitResult::Limited {
                retry_after: reset.max(1),
                limit: config.max_requests,
            };
        }

        state.count += 1;
        RateLimitResult::Allowed {
            remaining: config.max_requests.saturating_sub(state.count),
            limit: config.max_requests,
            reset,
        }
    }

    /// Drop entries whose window ended long ago.
    pub async fn cleanup(&self, max_window_secs: u64) {
        let mut states = self.states.write().await;
        let now = Instant::now();
        let max_window = Duration::from_secs(max_window_secs * 2);

        states.retain(|_, state| now.duration_since(state.window_start) < max_window);
    }

    /// Number of tracked keys.
    pub async fn key_count(&self) -> usize {
        self.states.read().await.len()
    }
}

/// Rate limit check result.
#[derive(Debug, Clone)]
pub enum RateLimitResult {
    Allowed {
        remaining: u32,
        limit: u32,
        /// Seconds until window reset.
        reset: u64,
    },
    Limited {
        /// Seconds until the window resets.
        retry_after: u64,
        limit: u32,
    },
}

/// Rate limiter state for middleware.
#[derive(Clone, Default)]
pub struct RateLimiterState {
    /// Keyed by signed-in user.
    pub user_limiter: ApiRateLimiter,
    /// Keyed by client IP for anonymous requests.
    pub ip_limiter: ApiRateLimiter,
}

impl RateLimiterState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Periodic cleanup of both limiters.
    pub async fn cleanup(&self) {
        let longest = [limits::STANDARD, limits::AUTH, limits::FORM, limits::UPLOAD]
            .iter()
            .map(|c| c.window_secs)
            .max()
            .unwrap_or(60);
        self.user_limiter.cleanup(longest).await;
        self.ip_limiter.cleanup(longest).await;
    }
}

/// Rate limit error response.
#[derive(Debug)]
pub struct RateLimitError {
    pub retry_after: u64,
}

impl IntoResponse for RateLimitError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({
            "error": {
                "code": "RATE_LIMITED",
                "message": "Too many requests",
                "retryAfter": self.retry_after
            }
        });

        (
            StatusCode::TOO_MANY_REQUESTS,
            [
                ("Retry-After", self.retry_after.to_string()),
                ("Content-Type", "application/json".to_string()),
            ],
            body.to_string(),
        )
            .into_response()
    }
}

/// Client IP from proxy headers, else the socket peer.
fn extract_client_ip(req: &Request<Body>) -> Option<IpAddr> {
    let header_ip = |name: &str| {
        req.headers()
            .get(name)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.split(',').next())
            .and_then(|value| value.trim().parse::<IpAddr>().ok())
    };

    header_ip("x-forwarded-for")
        .or_else(|| header_ip("x-real-ip"))
        .or_else(|| {
            req.extensions()
                .get::<ConnectInfo<SocketAddr>>()
                .map(|ConnectInfo(addr)| addr.ip())
        })
}

/// Rate limiting middleware for ordinary endpoints.
pub async fn rate_limit_middleware(
    State(limiter): State<RateLimiterState>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, RateLimitError> {
    rate_limit_with_config(limiter, req, next, &limits::STANDARD).await
}

/// Rate limiting middleware for authentication endpoints.
pub async fn rate_limit_auth_middleware(
    State(limiter): State<RateLimiterState>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, RateLimitError> {
    rate_limit_with_config(limiter, req, next, &limits::AUTH).await
}

/// Rate limiting middleware for public forms.
pub async fn rate_limit_form_middleware(
    State(limiter): State<RateLimiterState>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, RateLimitError> {
    rate_limit_with_config(limiter, req, next, &limits::FORM).await
}

/// Rate limiting middleware for uploads.
pub async fn rate_limit_upload_middleware(
    State(limiter): State<RateLimiterState>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, RateLimitError> {
    rate_limit_with_config(limiter, req, next, &limits::UPLOAD).await
}

async fn rate_limit_with_config(
    limiter: RateLimiterState,
    req: Request<Body>,
    next: Next,
    config: &RateLimitConfig,
) -> Result<Response, RateLimitError> {
    // The auth middleware runs first and stores the user.
    let result = if let Some(user) = req.extensions().get::<user::Model>() {
        limiter
            .user_limiter
            .check(&format!("user:{}", user.id), config)
            .await
    } else {
        let key = extract_client_ip(&req).map_or_else(|| "unknown".to_string(), |ip| format!("ip:{ip}"));
        limiter.ip_limiter.check(&key, config).await
    };

    match result {
        RateLimitResult::Allowed {
            remaining,
            limit,
            reset,
        } => {
            let mut response = next.run(req).await;

            let headers = response.headers_mut();
            headers.insert("X-RateLimit-Limit", limit.into());
            headers.insert("X-RateLimit-Remaining", remaining.into());
            headers.insert("X-RateLimit-Reset", reset.into());

            Ok(response)
        }
        RateLimitResult::Limited { retry_after, .. } => Err(RateLimitError { retry_after }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_api_rate_limiter_allows_requests() {
        let limiter = ApiRateLimiter::new();
        let config = RateLimitConfig::new("test", 5, 60);

        for _ in 0..5 {
            assert!(matches!(
                limiter.check("user_a", &config).await,
                RateLimitResult::Allowed { .. }
            ));
        }
    }

    #[tokio::test]
    async fn test_api_rate_limiter_blocks_after_limit() {
        let limiter = ApiRateLimiter::new();
        let config = RateLimitConfig::new("test", 3, 60);

        for _ in 0..3 {
            limiter.check("user_a", &config).await;
        }

        match limiter.check("user_a", &config).await {
            RateLimitResult::Limited { retry_after, limit } => {
                assert!(retry_after > 0);
                assert_eq!(limit, 3);
            }
            RateLimitResult::Allowed { .. } => panic!("Expected Limited"),
        }
    }

    #[tokio::test]
    async fn test_scopes_have_separate_windows() {
        let limiter = ApiRateLimiter::new();
        let auth = RateLimitConfig::new("auth", 1, 60);
        let standard = RateLimitConfig::new("standard", 10, 60);

        limiter.check("ip:1.2.3.4", &auth).await;
        assert!(matches!(
            limiter.check("ip:1.2.3.4", &auth).await,
            RateLimitResult::Limited { .. }
        ));
        assert!(matches!(
            limiter.check("ip:1.2.3.4", &standard).await,
            RateLimitResult::Allowed { .. }
        ));
        assert_eq!(limiter.key_count().await, 2);
    }

    #[tokio::test]
    async fn test_rate_limit_counters() {
        let limiter = ApiRateLimiter::new();
        let config = RateLimitConfig::new("test", 10, 60);

        match limiter.check("test", &config).await {
            RateLimitResult::Allowed {
                remaining,
                limit,
                reset,
            } => {
                assert_eq!(limit, 10);
                assert_eq!(remaining, 9);
                assert!(reset <= 60);
            }
            RateLimitResult::Limited { .. } => panic!("Expected Allowed"),
        }
    }

    #[test]
    fn test_client_ip_from_forwarded_header() {
        let req = Request::builder()
            .header("x-forwarded-for", "203.0.113.7, 10.0.0.1")
            .body(Body::empty())
            .unwrap();
        assert_eq!(extract_client_ip(&req), Some("203.0.113.7".parse().unwrap()));

        let req = Request::builder().body(Body::empty()).unwrap();
        assert_eq!(extract_client_ip(&req), None);
    }
}
