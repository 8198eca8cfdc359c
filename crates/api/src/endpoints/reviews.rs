//! Review endpoints.

use axum::{Json, Router, extract::State, routing::post};
use terapie_common::AppResult;
use terapie_core::CreateReviewInput;
use terapie_db::entities::review;

use crate::{extractors::AuthUser, middleware::AppState, response::ApiResponse};

async fn create(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(input): Json<CreateReviewInput>,
) -> AppResult<ApiResponse<review::Model>> {
    let review = state.review_service.create_review(&user, input).await?;
    Ok(ApiResponse::created(review))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/", post(create))
}
