//! Provider application repository.

use std::sync::Arc;

use crate::entities::{
    ProviderApplication,
    provider_application::{self, ApplicationKind, ApplicationStatus},
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect,
};
use terapie_common::{AppError, AppResult};

/// Repository for therapist/business applications.
#[derive(Clone)]
pub struct ProviderApplicationRepository {
    db: Arc<DatabaseConnection>,
}

impl ProviderApplicationRepository {
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    pub async fn create(
        &self,
        model: provider_application::ActiveModel,
    ) -> AppResult<provider_application::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<provider_application::Model>> {
        ProviderApplication::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    pub async fn get_by_id(&self, id: &str) -> AppResult<provider_application::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Application {id}")))
    }

    pub async fn update(
        &self,
        model: provider_application::ActiveModel,
    ) -> AppResult<provider_application::Model> {
        model
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// List applications, oldest pending first so the queue is worked in order.
    pub async fn list(
        &self,
        kind: Option<ApplicationKind>,
        status: Option<ApplicationStatus>,
        limit: u64,
        offset: u64,
    ) -> AppResult<Vec<provider_application::Model>> {
        use provider_application::Column;

        let mut query = ProviderApplication::find();

        if let Some(kind) = kind {
            query = query.filter(Column::Kind.eq(kind));
        }

        query = match status {
            Some(ApplicationStatus::Pending) => query
                .filter(Column::Status.eq(ApplicationStatus::Pending))
                .order_by_asc(Column::CreatedAt),
            Some(status) => query
                .filter(Column::Status.eq(status))
                .order_by_desc(Column::CreatedAt),
            None => query.order_by_desc(Column::CreatedAt),
        };

        query
            .offset(offset)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    pub async fn count_by_status(&self, status: ApplicationStatus) -> AppResult<u64> {
        ProviderApplication::find()
            .filter(provider_application::Column::Status.eq(status))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}
