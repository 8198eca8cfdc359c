//! Public blog endpoints.

use axum::{
    Router,
    extract::{Path, Query, State},
    routing::get,
};
use terapie_common::AppResult;
use terapie_core::ArticleFilter;
use terapie_db::entities::article;

use crate::{middleware::AppState, response::ApiResponse};

async fn list(
    State(state): State<AppState>,
    Query(filter): Query<ArticleFilter>,
) -> AppResult<ApiResponse<Vec<article::Model>>> {
    let articles = state.article_service.list_articles(&filter).await?;
    Ok(ApiResponse::ok(articles))
}

async fn show(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> AppResult<ApiResponse<article::Model>> {
    let article = state.article_service.get_article_by_slug(&slug).await?;
    Ok(ApiResponse::ok(article))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list))
        .route("/{slug}", get(show))
}
