//! Review repository.

use std::sync::Arc;

use crate::{
    ProviderRef,
    entities::{Review, review},
    write_err,
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, sea_query::SimpleExpr,
};
use terapie_common::{AppError, AppResult};

/// Review repository.
#[derive(Clone)]
pub struct ReviewRepository {
    db: Arc<DatabaseConnection>,
}

fn provider_filter(provider: &ProviderRef) -> SimpleExpr {
    match provider {
        ProviderRef::Therapist(id) => review::Column::TherapistId.eq(id.as_str()),
        ProviderRef::Business(id) => review::Column::BusinessId.eq(id.as_str()),
    }
}

impl ReviewRepository {
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Insert a review. A second review of the same provider yields `Conflict`.
    pub async fn create(&self, model: review::ActiveModel) -> AppResult<review::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| write_err(e, "You have already reviewed this provider"))
    }

    pub async fn find_by_client_and_provider(
        &self,
        client_id: &str,
        provider: &ProviderRef,
    ) -> AppResult<Option<review::Model>> {
        Review::find()
            .filter(review::Column::ClientId.eq(client_id))
            .filter(provider_filter(provider))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Reviews of a provider, newest first.
    pub async fn list_for_provider(
        &self,
        provider: &ProviderRef,
        limit: u64,
        offset: u64,
    ) -> AppResult<Vec<review::Model>> {
        Review::find()
            .filter(provider_filter(provider))
            .order_by_desc(review::Column::CreatedAt)
            .offset(offset)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Every rating a provider has received.
    pub async fn ratings_for_provider(&self, provider: &ProviderRef) -> AppResult<Vec<i16>> {
        Review::find()
            .select_only()
            .column(review::Column::Rating)
            .filter(provider_filter(provider))
            .into_tuple()
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}
