//! Therapist profile repository.

use std::sync::Arc;

use crate::{
    entities::{TherapistProfile, therapist_profile},
    ilike, write_err,
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect, Select, sea_query::Expr,
};
use serde::Deserialize;
use serde_json::json;
use terapie_common::{AppError, AppResult};

/// Listing order for provider profiles.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProfileSort {
    #[default]
    Rating,
    Reviews,
    Newest,
    Name,
}

/// Therapist directory filter.
#[derive(Debug, Clone, Default)]
pub struct TherapistQuery {
    pub search: Option<String>,
    pub specialty: Option<String>,
    pub location: Option<String>,
    pub language: Option<String>,
    pub verified_only: bool,
    pub sort: ProfileSort,
    pub limit: u64,
    pub offset: u64,
}

/// Therapist profile repository.
#[derive(Clone)]
pub struct TherapistProfileRepository {
    db: Arc<DatabaseConnection>,
}

impl TherapistProfileRepository {
    /// Create a new therapist profile repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<therapist_profile::Model>> {
        TherapistProfile::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    pub async fn get_by_id(&self, id: &str) -> AppResult<therapist_profile::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Therapist {id}")))
    }

    /// Find the profile owned by a user.
    pub async fn find_by_user_id(
        &self,
        user_id: &str,
    ) -> AppResult<Option<therapist_profile::Model>> {
        TherapistProfile::find()
            .filter(therapist_profile::Column::UserId.eq(user_id))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    pub async fn find_by_ids(&self, ids: &[String]) -> AppResult<Vec<therapist_profile::Model>> {
        if ids.is_empty() {
            return Ok(vec![]);
        }

        TherapistProfile::find()
            .filter(therapist_profile::Column::Id.is_in(ids.to_vec()))
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    pub async fn create(
        &self,
        model: therapist_profile::ActiveModel,
    ) -> AppResult<therapist_profile::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| write_err(e, "Therapist profile already exists"))
    }

    pub async fn update(
        &self,
        model: therapist_profile::ActiveModel,
    ) -> AppResult<therapist_profile::Model> {
        model
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Search the public directory.
    pub async fn search(&self, q: &TherapistQuery) -> AppResult<Vec<therapist_profile::Model>> {
        Self::search_query(q)
            .offset(q.offset)
            .limit(q.limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    fn search_query(q: &TherapistQuery) -> Select<TherapistProfile> {
        use therapist_profile::Column;

        let mut query = TherapistProfile::find();

        if q.verified_only {
            query = query.filter(Column::Verified.eq(true));
        }

        if let Some(text) = q.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            query = query.filter(
                Condition::any()
                    .add(ilike(Column::Name, text))
                    .add(ilike(Column::Title, text))
                    .add(ilike(Column::Bio, text)),
            );
        }

        if let Some(specialty) = q.specialty.as_deref().filter(|s| !s.is_empty()) {
            let needle = json!([specialty]);
            query = query.filter(
                Condition::any()
                    .add(Expr::cust_with_values("specialties @> ?", [needle.clone()]))
                    .add(Expr::cust_with_values("specializations @> ?", [needle])),
            );
        }

        if let Some(location) = q.location.as_deref().filter(|s| !s.is_empty()) {
            query = query.filter(ilike(Column::Location, location));
        }

        if let Some(language) = q.language.as_deref().filter(|s| !s.is_empty()) {
            query = query.filter(Expr::cust_with_values(
                "languages @> ?",
                [json!([language])],
            ));
        }

        match q.sort {
            ProfileSort::Rating => query
                .order_by_desc(Column::Rating)
                .order_by_desc(Column::ReviewCount),
            ProfileSort::Reviews => query
                .order_by_desc(Column::ReviewCount)
                .order_by_desc(Column::Rating),
            ProfileSort::Newest => query.order_by_desc(Column::CreatedAt),
            ProfileSort::Name => query.order_by_asc(Column::Name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::{DbBackend, QueryTrait};

    #[test]
    fn test_search_query_filters() {
        let sql = TherapistProfileRepository::search_query(&TherapistQuery {
            search: Some("anx".to_string()),
            specialty: Some("Anxietate".to_string()),
            verified_only: true,
            sort: ProfileSort::Name,
            ..Default::default()
        })
        .build(DbBackend::Postgres)
        .to_string();

        assert!(sql.contains("\"verified\" = TRUE"), "{sql}");
        assert!(sql.contains("specialties @>"), "{sql}");
        assert!(sql.contains("ORDER BY \"therapist_profile\".\"name\" ASC"), "{sql}");
    }

    #[test]
    fn test_search_query_ignores_blank_filters() {
        let sql = TherapistProfileRepository::search_query(&TherapistQuery {
            search: Some("   ".to_string()),
            location: Some(String::new()),
            ..Default::default()
        })
        .build(DbBackend::Postgres)
        .to_string();

        assert!(!sql.contains("WHERE"), "{sql}");
        assert!(sql.contains("ORDER BY \"therapist_profile\".\"rating\" DESC"), "{sql}");
    }
}
