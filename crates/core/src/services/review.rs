//! Client reviews of providers.

use chrono::Utc;
use sea_orm::Set;
use serde::Deserialize;
use terapie_common::{AppError, AppResult, IdGenerator};
use terapie_db::{
    ProviderRef,
    entities::{
        booking::{self, BookingStatus},
        business_profile, review, therapist_profile,
        user::{self, UserRole},
    },
    repositories::{
        BookingRepository, BusinessProfileRepository, ReviewRepository, TherapistProfileRepository,
    },
};
use tracing::info;
use validator::Validate;

use super::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};

/// Input for a review.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateReviewInput {
    pub booking_id: Option<String>,
    pub therapist_id: Option<String>,
    pub business_id: Option<String>,
    #[validate(range(min = 1, max = 5))]
    pub rating: i16,
    #[validate(length(max = 5000))]
    pub comment: Option<String>,
}

/// Mean rating rounded to two decimals; zero without reviews.
#[must_use]
pub fn average_rating(ratings: &[i16]) -> f64 {
    if ratings.is_empty() {
        return 0.0;
    }
    let sum: i64 = ratings.iter().map(|r| i64::from(*r)).sum();
    #[allow(clippy::cast_precision_loss)]
    let mean = sum as f64 / ratings.len() as f64;
    (mean * 100.0).round() / 100.0
}

/// Check that a booking can back a review of `provider` by `client_id`.
pub fn check_reviewable(
    booking: &booking::Model,
    client_id: &str,
    provider: &ProviderRef,
) -> AppResult<()> {
    if booking.client_id != client_id {
        return Err(AppError::Forbidden("This booking is not yours".to_string()));
    }
    let target =
        ProviderRef::from_columns(booking.therapist_id.as_deref(), booking.business_id.as_deref());
    if target.as_ref() != Some(provider) {
        return Err(AppError::BadRequest(
            "Booking does not match the reviewed provider".to_string(),
        ));
    }
    if booking.status != BookingStatus::Completed {
        return Err(AppError::BadRequest(
            "Only completed sessions can be reviewed".to_string(),
        ));
    }
    Ok(())
}

/// Review service.
#[derive(Clone)]
pub struct ReviewService {
    review_repo: ReviewRepository,
    booking_repo: BookingRepository,
    therapist_repo: TherapistProfileRepository,
    business_repo: BusinessProfileRepository,
    id_gen: IdGenerator,
}

impl ReviewService {
    #[must_use]
    pub const fn new(
        review_repo: ReviewRepository,
        booking_repo: BookingRepository,
        therapist_repo: TherapistProfileRepository,
        business_repo: BusinessProfileRepository,
    ) -> Self {
        Self {
            review_repo,
            booking_repo,
            therapist_repo,
            business_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Review a provider after a completed booking.
    pub async fn create_review(
        &self,
        client: &user::Model,
        input: CreateReviewInput,
    ) -> AppResult<review::Model> {
        input.validate()?;
        if client.role != UserRole::Client {
            return Err(AppError::Forbidden("Only clients can leave reviews".to_string()));
        }

        if input.therapist_id.is_some() && input.business_id.is_some() {
            return Err(AppError::BadRequest(
                "Review either a therapist or a business, not both".to_string(),
            ));
        }
        let provider = ProviderRef::from_columns(
            input.therapist_id.as_deref(),
            input.business_id.as_deref(),
        )
        .ok_or_else(|| {
            AppError::BadRequest("therapistId or businessId is required".to_string())
        })?;

        let booking = match &input.booking_id {
            Some(id) => self.booking_repo.get_by_id(id).await?,
            None => self
                .booking_repo
                .find_latest_completed(&client.id, &provider)
                .await?
                .ok_or_else(|| {
                    AppError::NotFound("No completed booking with this provider".to_string())
                })?,
        };
        check_reviewable(&booking, &client.id, &provider)?;

        if self
            .review_repo
            .find_by_client_and_provider(&client.id, &provider)
            .await?
            .is_some()
        {
            return Err(AppError::Conflict(
                "You have already reviewed this provider".to_string(),
            ));
        }

        let (therapist_id, business_id) = provider.columns();
        let review = self
            .review_repo
            .create(review::ActiveModel {
                id: Set(self.id_gen.generate()),
                booking_id: Set(Some(booking.id)),
                therapist_id: Set(therapist_id),
                business_id: Set(business_id),
                client_id: Set(client.id.clone()),
                rating: Set(input.rating),
                comment: Set(input
                    .comment
                    .map(|c| c.trim().to_string())
                    .filter(|c| !c.is_empty())),
                created_at: Set(Utc::now().into()),
            })
            .await?;

        self.recompute_rating(&provider).await?;
        info!(review = %review.id, provider = %provider.id(), rating = review.rating, "Review created");
        Ok(review)
    }

    /// Refresh the provider's `rating` and `review_count`.
    async fn recompute_rating(&self, provider: &ProviderRef) -> AppResult<()> {
        let ratings = self.review_repo.ratings_for_provider(provider).await?;
        let rating = average_rating(&ratings);
        let count = i32::try_from(ratings.len()).unwrap_or(i32::MAX);

        match provider {
            ProviderRef::Therapist(id) => {
                let profile = self.therapist_repo.get_by_id(id).await?;
                let mut active: therapist_profile::ActiveModel = profile.into();
                active.rating = Set(rating);
                active.review_count = Set(count);
                self.therapist_repo.update(active).await?;
            }
            ProviderRef::Business(id) => {
                let profile = self.business_repo.get_by_id(id).await?;
                let mut active: business_profile::ActiveModel = profile.into();
                active.rating = Set(rating);
                active.review_count = Set(count);
                self.business_repo.update(active).await?;
            }
        }
        Ok(())
    }

    /// Reviews of a provider, newest first.
    pub async fn list_reviews(
        &self,
        provider: &ProviderRef,
        limit: Option<u64>,
        offset: Option<u64>,
    ) -> AppResult<Vec<review::Model>> {
        self.review_repo
            .list_for_provider(
                provider,
                limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE),
                offset.unwrap_or(0),
            )
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::test_fixtures::{booking_model, therapist_model, user_model};
    use sea_orm::{DatabaseBackend, MockDatabase};
    use std::sync::Arc;

    #[test]
    fn test_average_rating() {
        assert!((average_rating(&[]) - 0.0).abs() < f64::EPSILON);
        assert!((average_rating(&[5, 4, 4]) - 4.33).abs() < 1e-9);
        assert!((average_rating(&[1, 2]) - 1.5).abs() < 1e-9);
    }

    #[test]
    fn test_check_reviewable() {
        let provider = ProviderRef::Therapist("t1".to_string());
        let completed = booking_model("b1", "c1", Some("t1"), BookingStatus::Completed);
        assert!(check_reviewable(&completed, "c1", &provider).is_ok());
        assert!(matches!(
            check_reviewable(&completed, "c2", &provider),
            Err(AppError::Forbidden(_))
        ));
        assert!(matches!(
            check_reviewable(&completed, "c1", &ProviderRef::Therapist("t9".to_string())),
            Err(AppError::BadRequest(_))
        ));

        let pending = booking_model("b2", "c1", Some("t1"), BookingStatus::Pending);
        assert!(matches!(
            check_reviewable(&pending, "c1", &provider),
            Err(AppError::BadRequest(_))
        ));
    }

    fn service(
        review_db: MockDatabase,
        booking_db: MockDatabase,
        therapist_db: MockDatabase,
    ) -> ReviewService {
        ReviewService::new(
            ReviewRepository::new(Arc::new(review_db.into_connection())),
            BookingRepository::new(Arc::new(booking_db.into_connection())),
            TherapistProfileRepository::new(Arc::new(therapist_db.into_connection())),
            BusinessProfileRepository::new(Arc::new(
                MockDatabase::new(DatabaseBackend::Postgres).into_connection(),
            )),
        )
    }

    fn input(rating: i16) -> CreateReviewInput {
        CreateReviewInput {
            booking_id: None,
            therapist_id: Some("t1".to_string()),
            business_id: None,
            rating,
            comment: Some("Foarte bine".to_string()),
        }
    }

    #[tokio::test]
    async fn test_rating_out_of_range() {
        let service = service(
            MockDatabase::new(DatabaseBackend::Postgres),
            MockDatabase::new(DatabaseBackend::Postgres),
            MockDatabase::new(DatabaseBackend::Postgres),
        );
        let client = user_model("c1", UserRole::Client);

        assert!(matches!(
            service.create_review(&client, input(6)).await,
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            service.create_review(&client, input(0)).await,
            Err(AppError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_review_naming_both_providers_is_rejected() {
        let service = service(
            MockDatabase::new(DatabaseBackend::Postgres),
            MockDatabase::new(DatabaseBackend::Postgres),
            MockDatabase::new(DatabaseBackend::Postgres),
        );
        let client = user_model("c1", UserRole::Client);
        let mut both = input(5);
        both.business_id = Some("b1".to_string());

        assert!(matches!(
            service.create_review(&client, both).await,
            Err(AppError::BadRequest(_))
        ));
    }

    #[tokio::test]
    async fn test_no_completed_booking() {
        let service = service(
            MockDatabase::new(DatabaseBackend::Postgres),
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<booking::Model>::new()]),
            MockDatabase::new(DatabaseBackend::Postgres),
        );
        let client = user_model("c1", UserRole::Client);

        assert!(matches!(
            service.create_review(&client, input(5)).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_second_review_conflicts() {
        let booking = booking_model("b1", "c1", Some("t1"), BookingStatus::Completed);
        let existing = review::Model {
            id: "r1".to_string(),
            booking_id: Some("b0".to_string()),
            therapist_id: Some("t1".to_string()),
            business_id: None,
            client_id: "c1".to_string(),
            rating: 4,
            comment: None,
            created_at: Utc::now().into(),
        };
        let service = service(
            MockDatabase::new(DatabaseBackend::Postgres).append_query_results([[existing]]),
            MockDatabase::new(DatabaseBackend::Postgres).append_query_results([[booking]]),
            MockDatabase::new(DatabaseBackend::Postgres),
        );
        let client = user_model("c1", UserRole::Client);

        assert!(matches!(
            service.create_review(&client, input(5)).await,
            Err(AppError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn test_create_review_updates_rating() {
        let booking = booking_model("b1", "c1", Some("t1"), BookingStatus::Completed);
        let created = review::Model {
            id: "r1".to_string(),
            booking_id: Some("b1".to_string()),
            therapist_id: Some("t1".to_string()),
            business_id: None,
            client_id: "c1".to_string(),
            rating: 5,
            comment: Some("Foarte bine".to_string()),
            created_at: Utc::now().into(),
        };
        let mut rated = therapist_model("t1", "u-t1");
        rated.rating = 4.5;
        rated.review_count = 2;

        let service = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<review::Model>::new()])
                .append_query_results([[created]])
                .append_query_results([[
                    maplit::btreemap! { "rating" => sea_orm::Value::from(4i16) },
                    maplit::btreemap! { "rating" => sea_orm::Value::from(5i16) },
                ]]),
            MockDatabase::new(DatabaseBackend::Postgres).append_query_results([[booking]]),
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[therapist_model("t1", "u-t1")]])
                .append_query_results([[rated]]),
        );
        let client = user_model("c1", UserRole::Client);

        let review = service.create_review(&client, input(5)).await.unwrap();
        assert_eq!(review.rating, 5);
    }
}
