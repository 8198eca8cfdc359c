//! Account settings endpoints.

use axum::{
    Json, Router,
    extract::State,
    routing::{delete, get},
};
use terapie_common::AppResult;
use terapie_core::UpdateSettingsInput;
use terapie_db::entities::user;

use crate::{
    extractors::AuthUser,
    middleware::AppState,
    response::{Ack, ApiResponse},
};

async fn get_settings(AuthUser(user): AuthUser) -> ApiResponse<user::Model> {
    ApiResponse::ok(user)
}

async fn update_settings(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(input): Json<UpdateSettingsInput>,
) -> AppResult<ApiResponse<user::Model>> {
    let user = state.account_service.update_settings(user, input).await?;
    Ok(ApiResponse::ok(user))
}

async fn delete_account(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<Ack>> {
    state.account_service.delete_account(&user).await?;
    Ok(Ack::ok())
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/settings", get(get_settings).patch(update_settings))
        .route("/", delete(delete_account))
}
