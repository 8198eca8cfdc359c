//! Therapist directory endpoints.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::get,
};
use terapie_common::AppResult;
use terapie_core::{TherapistFilter, UpdateTherapistInput};
use terapie_db::{
    ProviderRef,
    entities::{review, therapist_profile},
};

use super::Pagination;
use crate::{extractors::AuthUser, middleware::AppState, response::ApiResponse};

async fn list(
    State(state): State<AppState>,
    Query(filter): Query<TherapistFilter>,
) -> AppResult<ApiResponse<Vec<therapist_profile::Model>>> {
    let therapists = state.profile_service.list_therapists(filter).await?;
    Ok(ApiResponse::ok(therapists))
}

async fn show(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<therapist_profile::Model>> {
    let therapist = state.profile_service.get_therapist(&id).await?;
    Ok(ApiResponse::ok(therapist))
}

async fn reviews(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(page): Query<Pagination>,
) -> AppResult<ApiResponse<Vec<review::Model>>> {
    let reviews = state
        .review_service
        .list_reviews(&ProviderRef::Therapist(id), page.limit, page.offset)
        .await?;
    Ok(ApiResponse::ok(reviews))
}

async fn me(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<therapist_profile::Model>> {
    let therapist = state.profile_service.get_therapist_by_user(&user).await?;
    Ok(ApiResponse::ok(therapist))
}

async fn update_me(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(input): Json<UpdateTherapistInput>,
) -> AppResult<ApiResponse<therapist_profile::Model>> {
    let therapist = state
        .profile_service
        .update_therapist_profile(&user, input)
        .await?;
    Ok(ApiResponse::ok(therapist))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list))
        .route("/me", get(me).put(update_me))
        .route("/{id}", get(show))
        .route("/{id}/reviews", get(reviews))
}
