//! API endpoints.

mod account;
mod admin;
mod articles;
mod auth;
mod bookings;
mod businesses;
mod forms;
mod offers;
mod reviews;
mod therapists;
mod uploads;

use axum::{Router, middleware::from_fn_with_state};
use serde::Deserialize;

use crate::middleware::AppState;
use crate::rate_limit::{
    RateLimiterState, rate_limit_auth_middleware, rate_limit_form_middleware,
    rate_limit_upload_middleware,
};

/// Plain `limit`/`offset` query.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct Pagination {
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

/// Create the API router, mounted under `/api`.
///
/// Auth and public-form routes carry their own, stricter rate limits on
/// top of the standard one applied by [`crate::app`].
pub fn router(limiter: &RateLimiterState) -> Router<AppState> {
    let auth = auth::limited_router()
        .route_layer(from_fn_with_state(limiter.clone(), rate_limit_auth_middleware))
        .merge(auth::router());
    let forms = forms::router()
        .route_layer(from_fn_with_state(limiter.clone(), rate_limit_form_middleware));
    let uploads = uploads::router()
        .route_layer(from_fn_with_state(limiter.clone(), rate_limit_upload_middleware));

    Router::new()
        .nest("/auth", auth)
        .nest("/account", account::router())
        .nest("/therapists", therapists::router())
        .nest("/businesses", businesses::router())
        .nest("/offers", offers::router())
        .nest("/bookings", bookings::router())
        .nest("/reviews", reviews::router())
        .nest("/articles", articles::router())
        .nest("/uploads", uploads)
        .nest("/admin", admin::router())
        .merge(forms)
}
