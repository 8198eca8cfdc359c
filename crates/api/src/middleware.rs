//! Application state and authentication middleware.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::Response,
};
use axum_extra::headers::{Authorization, HeaderMapExt, authorization::Bearer};
use sea_orm::DatabaseConnection;
use terapie_common::{Config, StorageBackend};
use terapie_core::{
    AccountService, AdminService, ApprovalService, ArticleService, AvailabilityService,
    BookingHub, BookingService, ContactService, EmailService, EventPublisher, MessagingService,
    OfferService, ProfileService, ReviewService, UploadService,
};
use terapie_db::repositories::{
    ArticleRepository, BookingMessageRepository, BookingRepository, BusinessProfileRepository,
    ContactSubmissionRepository, OfferRepository, ProviderApplicationRepository,
    ReviewRepository, TherapistProfileRepository, UserRepository,
};
use tracing::debug;

use crate::rate_limit::RateLimiterState;

/// Buffered events per booking channel.
const BOOKING_CHANNEL_CAPACITY: usize = 64;

/// Application state.
#[derive(Clone)]
pub struct AppState {
    pub account_service: AccountService,
    pub profile_service: ProfileService,
    pub offer_service: OfferService,
    pub availability_service: AvailabilityService,
    pub booking_service: BookingService,
    pub messaging_service: MessagingService,
    pub review_service: ReviewService,
    pub approval_service: ApprovalService,
    pub admin_service: AdminService,
    pub contact_service: ContactService,
    pub article_service: ArticleService,
    pub upload_service: UploadService,
    pub booking_hub: Arc<BookingHub>,
    pub rate_limiter: RateLimiterState,
}

impl AppState {
    /// Wire repositories and services over one connection pool.
    #[must_use]
    pub fn new(
        db: Arc<DatabaseConnection>,
        config: &Config,
        email: EmailService,
        storage: Arc<dyn StorageBackend>,
    ) -> Self {
        let user_repo = UserRepository::new(Arc::clone(&db));
        let therapist_repo = TherapistProfileRepository::new(Arc::clone(&db));
        let business_repo = BusinessProfileRepository::new(Arc::clone(&db));
        let offer_repo = OfferRepository::new(Arc::clone(&db));
        let booking_repo = BookingRepository::new(Arc::clone(&db));
        let message_repo = BookingMessageRepository::new(Arc::clone(&db));
        let review_repo = ReviewRepository::new(Arc::clone(&db));
        let application_repo = ProviderApplicationRepository::new(Arc::clone(&db));
        let contact_repo = ContactSubmissionRepository::new(Arc::clone(&db));
        let article_repo = ArticleRepository::new(Arc::clone(&db));

        let booking_hub = Arc::new(BookingHub::new(BOOKING_CHANNEL_CAPACITY));
        let events: Arc<dyn EventPublisher> = booking_hub.clone();

        let profile_service = ProfileService::new(therapist_repo.clone(), business_repo.clone());
        let availability_service = AvailabilityService::new(
            therapist_repo.clone(),
            business_repo.clone(),
            offer_repo.clone(),
            booking_repo.clone(),
        );
        let booking_service = BookingService::new(
            booking_repo.clone(),
            message_repo.clone(),
            user_repo.clone(),
            offer_repo.clone(),
            profile_service.clone(),
            availability_service.clone(),
            email.clone(),
            events.clone(),
        );
        let messaging_service = MessagingService::new(
            message_repo,
            user_repo.clone(),
            booking_service.clone(),
            email.clone(),
            events,
        );

        Self {
            account_service: AccountService::new(
                user_repo.clone(),
                email.clone(),
                config.auth.clone(),
            ),
            offer_service: OfferService::new(offer_repo, profile_service.clone()),
            review_service: ReviewService::new(
                review_repo,
                booking_repo.clone(),
                therapist_repo.clone(),
                business_repo.clone(),
            ),
            approval_service: ApprovalService::new(
                application_repo.clone(),
                user_repo.clone(),
                therapist_repo,
                business_repo,
                email.clone(),
                config.auth.clone(),
            ),
            admin_service: AdminService::new(
                user_repo,
                application_repo,
                booking_repo,
                contact_repo.clone(),
                config.auth.clone(),
            ),
            contact_service: ContactService::new(contact_repo, email),
            article_service: ArticleService::new(article_repo),
            upload_service: UploadService::new(storage, &config.storage),
            profile_service,
            availability_service,
            booking_service,
            messaging_service,
            booking_hub,
            rate_limiter: RateLimiterState::new(),
        }
    }
}

/// Bearer token from the `Authorization` header.
pub fn bearer_token(req: &Request<Body>) -> Option<String> {
    req.headers()
        .typed_get::<Authorization<Bearer>>()
        .map(|auth| auth.token().trim().to_string())
        .filter(|token| !token.is_empty())
}

/// Authentication middleware.
///
/// Resolves the bearer token and stores the user in the request
/// extensions. Unknown tokens leave the request anonymous; extractors
/// decide whether that is acceptable.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    if let Some(token) = bearer_token(&req) {
        match state.account_service.authenticate_by_token(&token).await {
            Ok(user) => {
                req.extensions_mut().insert(user);
            }
            Err(e) => debug!(error = %e, "Bearer token rejected"),
        }
    }

    next.run(req).await
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn request_with(auth: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().uri("/api/auth/me");
        if let Some(value) = auth {
            builder = builder.header("Authorization", value);
        }
        builder.body(Body::empty()).unwrap()
    }

    #[test]
    fn test_bearer_token_is_extracted() {
        let req = request_with(Some("Bearer abc123"));
        assert_eq!(bearer_token(&req).as_deref(), Some("abc123"));
    }

    #[test]
    fn test_missing_or_foreign_scheme_is_anonymous() {
        assert_eq!(bearer_token(&request_with(None)), None);
        assert_eq!(bearer_token(&request_with(Some("Basic dXNlcjpwYXNz"))), None);
    }
}
