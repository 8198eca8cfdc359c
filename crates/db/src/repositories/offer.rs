//! Offer repository.

use std::sync::Arc;

use crate::{
    ProviderRef,
    entities::{Offer, offer},
    ilike,
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect, Select, sea_query::Expr,
};
use serde::Deserialize;
use serde_json::json;
use terapie_common::{AppError, AppResult};

/// Listing order for offers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OfferSort {
    #[default]
    Newest,
    PriceAsc,
    PriceDesc,
}

/// Offer catalogue filter.
#[derive(Debug, Clone, Default)]
pub struct OfferQuery {
    pub search: Option<String>,
    pub category: Option<String>,
    pub tag: Option<String>,
    pub location: Option<String>,
    pub min_price: Option<i32>,
    pub max_price: Option<i32>,
    pub provider: Option<ProviderRef>,
    pub include_inactive: bool,
    pub sort: OfferSort,
    pub limit: u64,
    pub offset: u64,
}

/// Offer repository.
#[derive(Clone)]
pub struct OfferRepository {
    db: Arc<DatabaseConnection>,
}

impl OfferRepository {
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<offer::Model>> {
        Offer::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    pub async fn get_by_id(&self, id: &str) -> AppResult<offer::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Offer {id}")))
    }

    pub async fn create(&self, model: offer::ActiveModel) -> AppResult<offer::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    pub async fn update(&self, model: offer::ActiveModel) -> AppResult<offer::Model> {
        model
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    pub async fn delete(&self, id: &str) -> AppResult<()> {
        Offer::delete_by_id(id)
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    pub async fn search(&self, q: &OfferQuery) -> AppResult<Vec<offer::Model>> {
        Self::search_query(q)
            .offset(q.offset)
            .limit(q.limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    fn search_query(q: &OfferQuery) -> Select<Offer> {
        use offer::Column;

        let mut query = Offer::find();

        if !q.include_inactive {
            query = query.filter(Column::Active.eq(true));
        }

        if let Some(text) = q.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            query = query.filter(
                Condition::any()
                    .add(ilike(Column::Title, text))
                    .add(ilike(Column::Description, text)),
            );
        }

        if let Some(category) = q.category.as_deref().filter(|s| !s.is_empty()) {
            query = query.filter(Column::Category.eq(category));
        }

        if let Some(tag) = q.tag.as_deref().filter(|s| !s.is_empty()) {
            query = query.filter(Expr::cust_with_values("tags @> ?", [json!([tag])]));
        }

        if let Some(location) = q.location.as_deref().filter(|s| !s.is_empty()) {
            query = query.filter(ilike(Column::Location, location));
        }

        if let Some(min) = q.min_price {
            query = query.filter(Column::Price.gte(min));
        }

        if let Some(max) = q.max_price {
            query = query.filter(Column::Price.lte(max));
        }

        match &q.provider {
            Some(ProviderRef::Therapist(id)) => {
                query = query.filter(Column::TherapistId.eq(id.as_str()));
            }
            Some(ProviderRef::Business(id)) => {
                query = query.filter(Column::BusinessId.eq(id.as_str()));
            }
            None => {}
        }

        match q.sort {
            OfferSort::Newest => query.order_by_desc(Column::CreatedAt),
            OfferSort::PriceAsc => query.order_by_asc(Column::Price),
            OfferSort::PriceDesc => query.order_by_desc(Column::Price),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::{DbBackend, QueryTrait};

    #[test]
    fn test_offer_query_price_range_and_owner() {
        let sql = OfferRepository::search_query(&OfferQuery {
            min_price: Some(100),
            max_price: Some(300),
            provider: Some(ProviderRef::Business("b1".to_string())),
            sort: OfferSort::PriceAsc,
            ..Default::default()
        })
        .build(DbBackend::Postgres)
        .to_string();

        assert!(sql.contains("\"price\" >= 100"), "{sql}");
        assert!(sql.contains("\"price\" <= 300"), "{sql}");
        assert!(sql.contains("\"business_id\" = 'b1'"), "{sql}");
        assert!(sql.contains("\"active\" = TRUE"), "{sql}");
        assert!(sql.contains("ORDER BY \"offer\".\"price\" ASC"), "{sql}");
    }

    #[test]
    fn test_offer_query_admin_view_includes_inactive() {
        let sql = OfferRepository::search_query(&OfferQuery {
            include_inactive: true,
            ..Default::default()
        })
        .build(DbBackend::Postgres)
        .to_string();

        assert!(!sql.contains("WHERE"), "{sql}");
    }
}
