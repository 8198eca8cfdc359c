//! Article repository.

use std::sync::Arc;

use crate::{
    entities::{
        Article,
        article::{self, FEATURED_TAG},
    },
    ilike, write_err,
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, sea_query::Expr,
};
use serde_json::json;
use terapie_common::{AppError, AppResult};

/// Blog listing filter.
#[derive(Debug, Clone, Default)]
pub struct ArticleQuery {
    pub tag: Option<String>,
    pub search: Option<String>,
    /// Include articles scheduled in the future (admin view)
    pub include_scheduled: bool,
    pub limit: u64,
    pub offset: u64,
}

/// Article repository.
#[derive(Clone)]
pub struct ArticleRepository {
    db: Arc<DatabaseConnection>,
}

impl ArticleRepository {
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    pub async fn create(&self, model: article::ActiveModel) -> AppResult<article::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| write_err(e, "Slug already in use"))
    }

    pub async fn update(&self, model: article::ActiveModel) -> AppResult<article::Model> {
        model
            .update(self.db.as_ref())
            .await
            .map_err(|e| write_err(e, "Slug already in use"))
    }

    pub async fn delete(&self, id: &str) -> AppResult<()> {
        Article::delete_by_id(id)
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    pub async fn get_by_id(&self, id: &str) -> AppResult<article::Model> {
        Article::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?
            .ok_or_else(|| AppError::NotFound(format!("Article {id}")))
    }

    pub async fn find_by_slug(&self, slug: &str) -> AppResult<Option<article::Model>> {
        Article::find()
            .filter(article::Column::Slug.eq(slug))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    pub async fn slug_exists(&self, slug: &str) -> AppResult<bool> {
        let count = Article::find()
            .filter(article::Column::Slug.eq(slug))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(count > 0)
    }

    /// Newest published first.
    pub async fn list(&self, q: &ArticleQuery) -> AppResult<Vec<article::Model>> {
        let mut query = Article::find().order_by_desc(article::Column::PublishedAt);

        if !q.include_scheduled {
            query = query.filter(article::Column::PublishedAt.lte(chrono::Utc::now()));
        }

        if let Some(tag) = q.tag.as_deref().filter(|t| !t.is_empty()) {
            query = query.filter(Expr::cust_with_values("tags @> ?", [json!([tag])]));
        }

        if let Some(text) = q.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            query = query.filter(
                Condition::any()
                    .add(ilike(article::Column::Title, text))
                    .add(ilike(article::Column::Excerpt, text)),
            );
        }

        query
            .offset(q.offset)
            .limit(q.limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Other articles currently carrying the featured tag.
    pub async fn find_featured_except(&self, id: &str) -> AppResult<Vec<article::Model>> {
        Article::find()
            .filter(article::Column::Id.ne(id))
            .filter(Expr::cust_with_values("tags @> ?", [json!([FEATURED_TAG])]))
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}
