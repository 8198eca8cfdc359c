//! HTTP API layer for terapie.
//!
//! - **Endpoints**: JSON API under `/api`
//! - **Extractors**: `AuthUser`, `MaybeAuthUser`, `AdminUser`
//! - **Middleware**: bearer-token authentication, rate limiting
//! - **Realtime**: WebSocket `/streaming` and per-booking SSE
//!
//! Built on Axum 0.8 with Tower middleware stack.

pub mod endpoints;
pub mod extractors;
pub mod middleware;
pub mod rate_limit;
pub mod response;
pub mod sse;
pub mod streaming;

use axum::{Router, middleware::from_fn_with_state, routing::get};

pub use endpoints::router;
pub use middleware::{AppState, auth_middleware};
pub use rate_limit::{ApiRateLimiter, RateLimitConfig, RateLimiterState};
pub use streaming::streaming_handler;

/// The application router: `/api`, `/streaming`, authentication and the
/// standard rate limit. Static files, CORS and tracing are added by the
/// server.
pub fn app(state: AppState) -> Router {
    let limiter = state.rate_limiter.clone();

    Router::new()
        .nest("/api", endpoints::router(&limiter))
        .route("/streaming", get(streaming_handler))
        .layer(from_fn_with_state(
            limiter,
            rate_limit::rate_limit_middleware,
        ))
        // Outermost, so the user is known to the rate limiters.
        .layer(from_fn_with_state(state.clone(), auth_middleware))
        .with_state(state)
}
