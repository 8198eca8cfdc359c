//! Offers listed by therapists and businesses.

use chrono::Utc;
use sea_orm::Set;
use serde::Deserialize;
use serde_json::Value;
use terapie_common::{AppError, AppResult, IdGenerator};
use terapie_db::{
    ProviderRef,
    entities::{
        offer,
        user::{self, UserRole},
    },
    repositories::{OfferQuery, OfferRepository, OfferSort},
};
use tracing::info;
use validator::Validate;

use super::availability::{DAY_NAMES, is_valid_slot};
use super::profile::ProfileService;
use super::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};

/// Public offer filter.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OfferFilter {
    pub search: Option<String>,
    pub category: Option<String>,
    pub tag: Option<String>,
    pub location: Option<String>,
    pub min_price: Option<i32>,
    pub max_price: Option<i32>,
    pub therapist_id: Option<String>,
    pub business_id: Option<String>,
    #[serde(default)]
    pub sort: OfferSort,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

/// Input for a new offer.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateOfferInput {
    #[validate(length(min = 1, max = 256))]
    pub title: String,
    #[validate(length(max = 2000))]
    pub description: Option<String>,
    #[validate(length(max = 20000))]
    pub long_description: Option<String>,
    #[validate(range(min = 0))]
    pub price: i32,
    #[validate(range(min = 0))]
    pub original_price: Option<i32>,
    #[validate(length(max = 256))]
    pub location: Option<String>,
    #[validate(length(max = 64))]
    pub duration: Option<String>,
    #[validate(length(max = 64))]
    pub category: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[validate(url)]
    pub image_url: Option<String>,
    #[validate(length(max = 128))]
    pub validity: Option<String>,
    /// Day name to list of `HH:MM` slots.
    pub availability: Option<Value>,
}

/// Partial offer update.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateOfferInput {
    #[validate(length(min = 1, max = 256))]
    pub title: Option<String>,
    #[validate(length(max = 2000))]
    pub description: Option<String>,
    #[validate(length(max = 20000))]
    pub long_description: Option<String>,
    #[validate(range(min = 0))]
    pub price: Option<i32>,
    #[validate(range(min = 0))]
    pub original_price: Option<i32>,
    #[validate(length(max = 256))]
    pub location: Option<String>,
    #[validate(length(max = 64))]
    pub duration: Option<String>,
    #[validate(length(max = 64))]
    pub category: Option<String>,
    pub tags: Option<Vec<String>>,
    #[validate(url)]
    pub image_url: Option<String>,
    #[validate(length(max = 128))]
    pub validity: Option<String>,
    pub availability: Option<Value>,
    pub active: Option<bool>,
}

/// Offer availability is a map of day name to a list of slots.
fn validate_offer_availability(availability: &Value) -> AppResult<()> {
    let days = availability
        .as_object()
        .ok_or_else(|| AppError::Validation("Availability must be an object".to_string()))?;

    for (day, slots) in days {
        if !DAY_NAMES.contains(&day.as_str()) {
            return Err(AppError::Validation(format!("Unknown day: {day}")));
        }
        let valid = slots
            .as_array()
            .is_some_and(|list| list.iter().all(|s| s.as_str().is_some_and(is_valid_slot)));
        if !valid {
            return Err(AppError::Validation(format!(
                "{day} must be a list of HH:MM slots"
            )));
        }
    }
    Ok(())
}

fn tag_array(tags: Vec<String>) -> Value {
    Value::Array(
        tags.into_iter()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .map(Value::String)
            .collect(),
    )
}

/// Offer service.
#[derive(Clone)]
pub struct OfferService {
    offer_repo: OfferRepository,
    profiles: ProfileService,
    id_gen: IdGenerator,
}

impl OfferService {
    #[must_use]
    pub const fn new(offer_repo: OfferRepository, profiles: ProfileService) -> Self {
        Self {
            offer_repo,
            profiles,
            id_gen: IdGenerator::new(),
        }
    }

    /// Active offers matching a filter.
    pub async fn list_offers(&self, filter: OfferFilter) -> AppResult<Vec<offer::Model>> {
        let provider = filter
            .therapist_id
            .map(ProviderRef::Therapist)
            .or(filter.business_id.map(ProviderRef::Business));

        self.offer_repo
            .search(&OfferQuery {
                search: filter.search,
                category: filter.category,
                tag: filter.tag,
                location: filter.location,
                min_price: filter.min_price,
                max_price: filter.max_price,
                provider,
                include_inactive: false,
                sort: filter.sort,
                limit: filter.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE),
                offset: filter.offset.unwrap_or(0),
            })
            .await
    }

    /// Every offer of the signed-in provider, inactive ones included.
    pub async fn list_own_offers(&self, user: &user::Model) -> AppResult<Vec<offer::Model>> {
        let provider = self.profiles.require_provider(user).await?;
        self.offer_repo
            .search(&OfferQuery {
                provider: Some(provider),
                include_inactive: true,
                limit: MAX_PAGE_SIZE,
                ..Default::default()
            })
            .await
    }

    /// A single offer. Inactive offers are only visible to their owner.
    pub async fn get_offer(
        &self,
        id: &str,
        viewer: Option<&user::Model>,
    ) -> AppResult<offer::Model> {
        let offer = self.offer_repo.get_by_id(id).await?;
        if offer.active {
            return Ok(offer);
        }
        if let Some(viewer) = viewer {
            if self.can_manage(viewer, &offer).await? {
                return Ok(offer);
            }
        }
        Err(AppError::NotFound(format!("Offer {id}")))
    }

    async fn can_manage(&self, user: &user::Model, offer: &offer::Model) -> AppResult<bool> {
        if user.role == UserRole::Admin {
            return Ok(true);
        }
        let owner = ProviderRef::from_columns(offer.therapist_id.as_deref(), offer.business_id.as_deref());
        Ok(owner.is_some() && self.profiles.provider_for_user(user).await? == owner)
    }

    async fn owned_offer(&self, user: &user::Model, id: &str) -> AppResult<offer::Model> {
        let offer = self.offer_repo.get_by_id(id).await?;
        if !self.can_manage(user, &offer).await? {
            return Err(AppError::Forbidden("You do not own this offer".to_string()));
        }
        Ok(offer)
    }

    pub async fn create_offer(
        &self,
        user: &user::Model,
        input: CreateOfferInput,
    ) -> AppResult<offer::Model> {
        input.validate()?;
        if let Some(availability) = &input.availability {
            validate_offer_availability(availability)?;
        }

        let provider = self.profiles.require_provider(user).await?;
        let (therapist_id, business_id) = provider.columns();

        let model = offer::ActiveModel {
            id: Set(self.id_gen.generate()),
            therapist_id: Set(therapist_id),
            business_id: Set(business_id),
            title: Set(input.title.trim().to_string()),
            description: Set(input.description),
            long_description: Set(input.long_description),
            price: Set(input.price),
            original_price: Set(input.original_price),
            location: Set(input.location),
            duration: Set(input.duration),
            category: Set(input.category),
            tags: Set(tag_array(input.tags)),
            image_url: Set(input.image_url),
            validity: Set(input.validity),
            availability: Set(input.availability.unwrap_or_else(|| serde_json::json!({}))),
            active: Set(true),
            created_at: Set(Utc::now().into()),
            updated_at: Set(None),
        };

        let offer = self.offer_repo.create(model).await?;
        info!(offer = %offer.id, provider = %provider.id(), "Offer created");
        Ok(offer)
    }

    pub async fn update_offer(
        &self,
        user: &user::Model,
        id: &str,
        input: UpdateOfferInput,
    ) -> AppResult<offer::Model> {
        input.validate()?;
        if let Some(availability) = &input.availability {
            validate_offer_availability(availability)?;
        }

        let offer = self.owned_offer(user, id).await?;
        let mut active: offer::ActiveModel = offer.into();

        if let Some(title) = input.title {
            active.title = Set(title.trim().to_string());
        }
        if let Some(description) = input.description {
            active.description = Set(Some(description));
        }
        if let Some(long_description) = input.long_description {
            active.long_description = Set(Some(long_description));
        }
        if let Some(price) = input.price {
            active.price = Set(price);
        }
        if let Some(original_price) = input.original_price {
            active.original_price = Set(Some(original_price));
        }
        if let Some(location) = input.location {
            active.location = Set(Some(location));
        }
        if let Some(duration) = input.duration {
            active.duration = Set(Some(duration));
        }
        if let Some(category) = input.category {
            active.category = Set(Some(category));
        }
        if let Some(tags) = input.tags {
            active.tags = Set(tag_array(tags));
        }
        if let Some(url) = input.image_url {
            active.image_url = Set(Some(url));
        }
        if let Some(validity) = input.validity {
            active.validity = Set(Some(validity));
        }
        if let Some(availability) = input.availability {
            active.availability = Set(availability);
        }
        if let Some(flag) = input.active {
            active.active = Set(flag);
        }
        active.updated_at = Set(Some(Utc::now().into()));

        self.offer_repo.update(active).await
    }

    pub async fn delete_offer(&self, user: &user::Model, id: &str) -> AppResult<()> {
        let offer = self.owned_offer(user, id).await?;
        self.offer_repo.delete(&offer.id).await?;
        info!(offer = %offer.id, "Offer deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::test_fixtures::{offer_model, therapist_model, user_model};
    use sea_orm::{DatabaseBackend, MockDatabase};
    use serde_json::json;
    use std::sync::Arc;
    use terapie_db::{
        entities::therapist_profile,
        repositories::{BusinessProfileRepository, TherapistProfileRepository},
    };

    fn service(offer_db: MockDatabase, therapist_db: MockDatabase) -> OfferService {
        let profiles = ProfileService::new(
            TherapistProfileRepository::new(Arc::new(therapist_db.into_connection())),
            BusinessProfileRepository::new(Arc::new(
                MockDatabase::new(DatabaseBackend::Postgres).into_connection(),
            )),
        );
        OfferService::new(OfferRepository::new(Arc::new(offer_db.into_connection())), profiles)
    }

    #[test]
    fn test_validate_offer_availability() {
        assert!(validate_offer_availability(&json!({ "monday": ["10:00"] })).is_ok());
        assert!(validate_offer_availability(&json!({ "monday": "10:00" })).is_err());
        assert!(validate_offer_availability(&json!({ "someday": [] })).is_err());
        assert!(validate_offer_availability(&json!({ "friday": ["10"] })).is_err());
    }

    #[tokio::test]
    async fn test_update_by_non_owner_is_forbidden() {
        let service = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[offer_model("o1", Some("t1"), None)]]),
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[therapist_model("t2", "u2")]]),
        );
        let other = user_model("u2", UserRole::Therapist);

        let result = service
            .update_offer(&other, "o1", UpdateOfferInput::default())
            .await;
        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_create_requires_provider_profile() {
        let service = service(
            MockDatabase::new(DatabaseBackend::Postgres),
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<therapist_profile::Model>::new()]),
        );
        let user = user_model("u1", UserRole::Therapist);

        let result = service
            .create_offer(
                &user,
                CreateOfferInput {
                    title: "Masaj".to_string(),
                    description: None,
                    long_description: None,
                    price: 150,
                    original_price: None,
                    location: None,
                    duration: None,
                    category: None,
                    tags: vec![],
                    image_url: None,
                    validity: None,
                    availability: None,
                },
            )
            .await;
        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_inactive_offer_hidden_from_public() {
        let mut offer = offer_model("o1", Some("t1"), None);
        offer.active = false;
        let service = service(
            MockDatabase::new(DatabaseBackend::Postgres).append_query_results([[offer]]),
            MockDatabase::new(DatabaseBackend::Postgres),
        );

        let result = service.get_offer("o1", None).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }
}
