//! Therapist and business directory.

use chrono::Utc;
use sea_orm::Set;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use terapie_common::{AppError, AppResult};
use terapie_db::{
    ProviderRef,
    entities::{business_profile, therapist_profile, user},
    repositories::{
        BusinessProfileRepository, BusinessQuery, ProfileSort, TherapistProfileRepository,
        TherapistQuery,
    },
};
use validator::Validate;

use super::availability::{is_valid_slot, validate_weekly_schedule};
use super::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};

/// Public therapist directory filter.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TherapistFilter {
    pub search: Option<String>,
    pub specialty: Option<String>,
    pub location: Option<String>,
    pub language: Option<String>,
    #[serde(default)]
    pub verified_only: bool,
    #[serde(default)]
    pub sort: ProfileSort,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

/// Public business directory filter.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BusinessFilter {
    pub search: Option<String>,
    pub location: Option<String>,
    #[serde(default)]
    pub verified_only: bool,
    #[serde(default)]
    pub sort: ProfileSort,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

/// Editable therapist profile fields.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTherapistInput {
    #[validate(length(min = 1, max = 256))]
    pub name: Option<String>,
    #[validate(length(max = 256))]
    pub title: Option<String>,
    #[validate(length(max = 10000))]
    pub bio: Option<String>,
    pub specialties: Option<Vec<String>>,
    pub specializations: Option<Vec<String>>,
    #[validate(length(max = 64))]
    pub medical_code: Option<String>,
    #[validate(length(max = 256))]
    pub location: Option<String>,
    #[validate(length(max = 64))]
    pub price_range: Option<String>,
    pub languages: Option<Vec<String>>,
    pub education: Option<Vec<Value>>,
    #[validate(length(max = 512))]
    pub availability: Option<String>,
    pub weekly_schedule: Option<Value>,
    pub available_slots: Option<Vec<String>>,
    #[validate(url)]
    pub image_url: Option<String>,
}

/// Editable business profile fields.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBusinessInput {
    #[validate(length(min = 1, max = 256))]
    pub company_name: Option<String>,
    #[validate(length(max = 10000))]
    pub description: Option<String>,
    #[validate(length(max = 256))]
    pub location: Option<String>,
    #[validate(length(max = 512))]
    pub address: Option<String>,
    #[validate(length(max = 32))]
    pub phone: Option<String>,
    #[validate(url)]
    pub website: Option<String>,
    #[validate(length(max = 64))]
    pub registration_code: Option<String>,
    #[validate(url)]
    pub image_url: Option<String>,
    pub weekly_schedule: Option<Value>,
}

/// Account that owns a provider profile.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderOwner {
    pub provider: ProviderRef,
    pub user_id: String,
    pub display_name: String,
}

fn string_array(items: Vec<String>) -> Value {
    Value::Array(
        items
            .into_iter()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .map(Value::String)
            .collect(),
    )
}

fn page(limit: Option<u64>, offset: Option<u64>) -> (u64, u64) {
    (
        limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE),
        offset.unwrap_or(0),
    )
}

/// Directory service.
#[derive(Clone)]
pub struct ProfileService {
    therapist_repo: TherapistProfileRepository,
    business_repo: BusinessProfileRepository,
}

impl ProfileService {
    #[must_use]
    pub const fn new(
        therapist_repo: TherapistProfileRepository,
        business_repo: BusinessProfileRepository,
    ) -> Self {
        Self {
            therapist_repo,
            business_repo,
        }
    }

    pub async fn list_therapists(
        &self,
        filter: TherapistFilter,
    ) -> AppResult<Vec<therapist_profile::Model>> {
        let (limit, offset) = page(filter.limit, filter.offset);
        self.therapist_repo
            .search(&TherapistQuery {
                search: filter.search,
                specialty: filter.specialty,
                location: filter.location,
                language: filter.language,
                verified_only: filter.verified_only,
                sort: filter.sort,
                limit,
                offset,
            })
            .await
    }

    pub async fn get_therapist(&self, id: &str) -> AppResult<therapist_profile::Model> {
        self.therapist_repo.get_by_id(id).await
    }

    /// Profile of the signed-in therapist.
    pub async fn get_therapist_by_user(
        &self,
        user: &user::Model,
    ) -> AppResult<therapist_profile::Model> {
        self.therapist_repo
            .find_by_user_id(&user.id)
            .await?
            .ok_or_else(|| AppError::NotFound("Therapist profile".to_string()))
    }

    pub async fn update_therapist_profile(
        &self,
        user: &user::Model,
        input: UpdateTherapistInput,
    ) -> AppResult<therapist_profile::Model> {
        input.validate()?;
        if let Some(schedule) = &input.weekly_schedule {
            validate_weekly_schedule(schedule)?;
        }
        if let Some(slots) = &input.available_slots {
            if let Some(bad) = slots.iter().find(|s| !is_valid_slot(s)) {
                return Err(AppError::Validation(format!("Invalid time slot: {bad}")));
            }
        }

        let profile = self.get_therapist_by_user(user).await?;
        let mut active: therapist_profile::ActiveModel = profile.into();

        if let Some(name) = input.name {
            active.name = Set(name.trim().to_string());
        }
        if let Some(title) = input.title {
            active.title = Set(Some(title));
        }
        if let Some(bio) = input.bio {
            active.bio = Set(Some(bio));
        }
        if let Some(items) = input.specialties {
            active.specialties = Set(string_array(items));
        }
        if let Some(items) = input.specializations {
            active.specializations = Set(string_array(items));
        }
        if let Some(code) = input.medical_code {
            active.medical_code = Set(Some(code));
        }
        if let Some(location) = input.location {
            active.location = Set(Some(location));
        }
        if let Some(price_range) = input.price_range {
            active.price_range = Set(Some(price_range));
        }
        if let Some(items) = input.languages {
            active.languages = Set(string_array(items));
        }
        if let Some(items) = input.education {
            active.education = Set(Value::Array(items));
        }
        if let Some(availability) = input.availability {
            active.availability = Set(Some(availability));
        }
        if let Some(schedule) = input.weekly_schedule {
            active.weekly_schedule = Set(Some(schedule));
        }
        if let Some(slots) = input.available_slots {
            active.available_slots = Set(string_array(slots));
        }
        if let Some(url) = input.image_url {
            active.image_url = Set(Some(url));
        }
        active.updated_at = Set(Some(Utc::now().into()));

        self.therapist_repo.update(active).await
    }

    pub async fn list_businesses(
        &self,
        filter: BusinessFilter,
    ) -> AppResult<Vec<business_profile::Model>> {
        let (limit, offset) = page(filter.limit, filter.offset);
        self.business_repo
            .search(&BusinessQuery {
                search: filter.search,
                location: filter.location,
                verified_only: filter.verified_only,
                sort: filter.sort,
                limit,
                offset,
            })
            .await
    }

    pub async fn get_business(&self, id: &str) -> AppResult<business_profile::Model> {
        self.business_repo.get_by_id(id).await
    }

    pub async fn get_business_by_user(
        &self,
        user: &user::Model,
    ) -> AppResult<business_profile::Model> {
        self.business_repo
            .find_by_user_id(&user.id)
            .await?
            .ok_or_else(|| AppError::NotFound("Business profile".to_string()))
    }

    pub async fn update_business_profile(
        &self,
        user: &user::Model,
        input: UpdateBusinessInput,
    ) -> AppResult<business_profile::Model> {
        input.validate()?;
        if let Some(schedule) = &input.weekly_schedule {
            validate_weekly_schedule(schedule)?;
        }

        let profile = self.get_business_by_user(user).await?;
        let mut active: business_profile::ActiveModel = profile.into();

        if let Some(name) = input.company_name {
            active.company_name = Set(name.trim().to_string());
        }
        if let Some(description) = input.description {
            active.description = Set(Some(description));
        }
        if let Some(location) = input.location {
            active.location = Set(Some(location));
        }
        if let Some(address) = input.address {
            active.address = Set(Some(address));
        }
        if let Some(phone) = input.phone {
            active.phone = Set(Some(phone));
        }
        if let Some(website) = input.website {
            active.website = Set(Some(website));
        }
        if let Some(code) = input.registration_code {
            active.registration_code = Set(Some(code));
        }
        if let Some(url) = input.image_url {
            active.image_url = Set(Some(url));
        }
        if let Some(schedule) = input.weekly_schedule {
            active.weekly_schedule = Set(Some(schedule));
        }
        active.updated_at = Set(Some(Utc::now().into()));

        self.business_repo.update(active).await
    }

    /// The provider profile a user acts as, if any.
    pub async fn provider_for_user(&self, user: &user::Model) -> AppResult<Option<ProviderRef>> {
        match user.role {
            user::UserRole::Therapist => Ok(self
                .therapist_repo
                .find_by_user_id(&user.id)
                .await?
                .map(|p| ProviderRef::Therapist(p.id))),
            user::UserRole::Business => Ok(self
                .business_repo
                .find_by_user_id(&user.id)
                .await?
                .map(|p| ProviderRef::Business(p.id))),
            user::UserRole::Client | user::UserRole::Admin => Ok(None),
        }
    }

    /// Like [`Self::provider_for_user`] but a missing profile is forbidden.
    pub async fn require_provider(&self, user: &user::Model) -> AppResult<ProviderRef> {
        self.provider_for_user(user).await?.ok_or_else(|| {
            AppError::Forbidden("Only therapists and businesses can do this".to_string())
        })
    }

    /// Owning account and display name of a provider profile.
    pub async fn owner_of(&self, provider: &ProviderRef) -> AppResult<ProviderOwner> {
        let (user_id, display_name) = match provider {
            ProviderRef::Therapist(id) => {
                let p = self.therapist_repo.get_by_id(id).await?;
                (p.user_id, p.name)
            }
            ProviderRef::Business(id) => {
                let p = self.business_repo.get_by_id(id).await?;
                (p.user_id, p.company_name)
            }
        };
        Ok(ProviderOwner {
            provider: provider.clone(),
            user_id,
            display_name,
        })
    }
}
