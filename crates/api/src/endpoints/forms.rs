//! Public forms: provider applications and the contact form.

use axum::{Json, Router, extract::State, routing::post};
use terapie_common::AppResult;
use terapie_core::{ContactInput, SubmitApplicationInput};
use terapie_db::entities::{contact_submission, provider_application};

use crate::{extractors::MaybeAuthUser, middleware::AppState, response::ApiResponse};

/// Apply to join as a therapist or business. Signed-in applicants are
/// linked to their account.
async fn apply(
    MaybeAuthUser(user): MaybeAuthUser,
    State(state): State<AppState>,
    Json(input): Json<SubmitApplicationInput>,
) -> AppResult<ApiResponse<provider_application::Model>> {
    let application = state
        .approval_service
        .submit_application(user.as_ref(), input)
        .await?;
    Ok(ApiResponse::created(application))
}

async fn contact(
    State(state): State<AppState>,
    Json(input): Json<ContactInput>,
) -> AppResult<ApiResponse<contact_submission::Model>> {
    let submission = state.contact_service.submit_contact(input).await?;
    Ok(ApiResponse::created(submission))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/applications", post(apply))
        .route("/contact", post(contact))
}
