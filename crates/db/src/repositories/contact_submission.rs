//! Contact submission repository.

use std::sync::Arc;

use crate::entities::{
    ContactSubmission,
    contact_submission::{self, SubmissionStatus},
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect,
};
use terapie_common::{AppError, AppResult};

#[derive(Clone)]
pub struct ContactSubmissionRepository {
    db: Arc<DatabaseConnection>,
}

impl ContactSubmissionRepository {
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    pub async fn create(
        &self,
        model: contact_submission::ActiveModel,
    ) -> AppResult<contact_submission::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    pub async fn get_by_id(&self, id: &str) -> AppResult<contact_submission::Model> {
        ContactSubmission::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?
            .ok_or_else(|| AppError::NotFound(format!("Contact submission {id}")))
    }

    pub async fn update(
        &self,
        model: contact_submission::ActiveModel,
    ) -> AppResult<contact_submission::Model> {
        model
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    pub async fn list(
        &self,
        status: Option<SubmissionStatus>,
        limit: u64,
        offset: u64,
    ) -> AppResult<Vec<contact_submission::Model>> {
        let mut query =
            ContactSubmission::find().order_by_desc(contact_submission::Column::CreatedAt);

        if let Some(status) = status {
            query = query.filter(contact_submission::Column::Status.eq(status));
        }

        query
            .offset(offset)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    pub async fn count_by_status(&self, status: SubmissionStatus) -> AppResult<u64> {
        ContactSubmission::find()
            .filter(contact_submission::Column::Status.eq(status))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}
