//! Business directory endpoints.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::get,
};
use terapie_common::AppResult;
use terapie_core::{BusinessFilter, UpdateBusinessInput};
use terapie_db::{
    ProviderRef,
    entities::{business_profile, review},
};

use super::Pagination;
use crate::{extractors::AuthUser, middleware::AppState, response::ApiResponse};

async fn list(
    State(state): State<AppState>,
    Query(filter): Query<BusinessFilter>,
) -> AppResult<ApiResponse<Vec<business_profile::Model>>> {
    let businesses = state.profile_service.list_businesses(filter).await?;
    Ok(ApiResponse::ok(businesses))
}

async fn show(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<business_profile::Model>> {
    let business = state.profile_service.get_business(&id).await?;
    Ok(ApiResponse::ok(business))
}

async fn reviews(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(page): Query<Pagination>,
) -> AppResult<ApiResponse<Vec<review::Model>>> {
    let reviews = state
        .review_service
        .list_reviews(&ProviderRef::Business(id), page.limit, page.offset)
        .await?;
    Ok(ApiResponse::ok(reviews))
}

async fn me(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<business_profile::Model>> {
    let business = state.profile_service.get_business_by_user(&user).await?;
    Ok(ApiResponse::ok(business))
}

async fn update_me(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(input): Json<UpdateBusinessInput>,
) -> AppResult<ApiResponse<business_profile::Model>> {
    let business = state
        .profile_service
        .update_business_profile(&user, input)
        .await?;
    Ok(ApiResponse::ok(business))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list))
        .route("/me", get(me).put(update_me))
        .route("/{id}", get(show))
        .route("/{id}/reviews", get(reviews))
}
