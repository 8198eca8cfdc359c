//! Business profile repository.

use std::sync::Arc;

use super::ProfileSort;
use crate::{
    entities::{BusinessProfile, business_profile},
    ilike, write_err,
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect,
};
use terapie_common::{AppError, AppResult};

/// Business directory filter.
#[derive(Debug, Clone, Default)]
pub struct BusinessQuery {
    pub search: Option<String>,
    pub location: Option<String>,
    pub verified_only: bool,
    pub sort: ProfileSort,
    pub limit: u64,
    pub offset: u64,
}

/// Business profile repository.
#[derive(Clone)]
pub struct BusinessProfileRepository {
    db: Arc<DatabaseConnection>,
}

impl BusinessProfileRepository {
    /// Create a new business profile repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<business_profile::Model>> {
        BusinessProfile::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    pub async fn get_by_id(&self, id: &str) -> AppResult<business_profile::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Business {id}")))
    }

    pub async fn find_by_user_id(
        &self,
        user_id: &str,
    ) -> AppResult<Option<business_profile::Model>> {
        BusinessProfile::find()
            .filter(business_profile::Column::UserId.eq(user_id))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    pub async fn create(
        &self,
        model: business_profile::ActiveModel,
    ) -> AppResult<business_profile::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| write_err(e, "Business profile already exists"))
    }

    pub async fn update(
        &self,
        model: business_profile::ActiveModel,
    ) -> AppResult<business_profile::Model> {
        model
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    pub async fn search(&self, q: &BusinessQuery) -> AppResult<Vec<business_profile::Model>> {
        use business_profile::Column;

        let mut query = BusinessProfile::find();

        if q.verified_only {
            query = query.filter(Column::Verified.eq(true));
        }

        if let Some(text) = q.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            query = query.filter(
                Condition::any()
                    .add(ilike(Column::CompanyName, text))
                    .add(ilike(Column::Description, text)),
            );
        }

        if let Some(location) = q.location.as_deref().filter(|s| !s.is_empty()) {
            query = query.filter(ilike(Column::Location, location));
        }

        query = match q.sort {
            ProfileSort::Rating => query.order_by_desc(Column::Rating),
            ProfileSort::Reviews => query.order_by_desc(Column::ReviewCount),
            ProfileSort::Newest => query.order_by_desc(Column::CreatedAt),
            ProfileSort::Name => query.order_by_asc(Column::CompanyName),
        };

        query
            .offset(q.offset)
            .limit(q.limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}
