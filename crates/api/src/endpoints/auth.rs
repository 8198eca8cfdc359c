//! Authentication endpoints.

use axum::{
    Json, Router,
    extract::State,
    routing::{get, post},
};
use serde::Deserialize;
use terapie_common::AppResult;
use terapie_core::{Session, SignupInput, SignupOutcome};
use terapie_db::entities::user;
use validator::Validate;

use crate::{
    extractors::AuthUser,
    middleware::AppState,
    response::{Ack, ApiResponse},
};

/// Email confirmation request.
#[derive(Debug, Deserialize)]
pub struct ConfirmRequest {
    pub token: String,
}

/// Signin request.
#[derive(Debug, Deserialize)]
pub struct SigninRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub current_password: String,
    #[validate(length(max = 128))]
    pub new_password: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ResetRequest {
    #[validate(email)]
    pub email: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ResetPasswordRequest {
    pub token: String,
    #[validate(length(max = 128))]
    pub password: String,
}

async fn signup(
    State(state): State<AppState>,
    Json(input): Json<SignupInput>,
) -> AppResult<ApiResponse<SignupOutcome>> {
    let outcome = state.account_service.signup(input).await?;
    Ok(ApiResponse::created(outcome))
}

async fn confirm(
    State(state): State<AppState>,
    Json(req): Json<ConfirmRequest>,
) -> AppResult<ApiResponse<user::Model>> {
    let user = state.account_service.confirm_email(&req.token).await?;
    Ok(ApiResponse::ok(user))
}

async fn signin(
    State(state): State<AppState>,
    Json(req): Json<SigninRequest>,
) -> AppResult<ApiResponse<Session>> {
    let session = state
        .account_service
        .signin(&req.email, &req.password)
        .await?;
    Ok(ApiResponse::ok(session))
}

/// Sign out by rotating the session token.
async fn signout(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<Ack>> {
    state.account_service.signout(user).await?;
    Ok(Ack::ok())
}

async fn change_password(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<ChangePasswordRequest>,
) -> AppResult<ApiResponse<Session>> {
    req.validate()?;
    let session = state
        .account_service
        .change_password(user, &req.current_password, &req.new_password)
        .await?;
    Ok(ApiResponse::ok(session))
}

/// Always acknowledges, whether or not the address has an account.
async fn request_reset(
    State(state): State<AppState>,
    Json(req): Json<ResetRequest>,
) -> AppResult<ApiResponse<Ack>> {
    req.validate()?;
    state.account_service.request_password_reset(&req.email).await?;
    Ok(Ack::ok())
}

async fn reset_password(
    State(state): State<AppState>,
    Json(req): Json<ResetPasswordRequest>,
) -> AppResult<ApiResponse<Session>> {
    req.validate()?;
    let session = state
        .account_service
        .reset_password(&req.token, &req.password)
        .await?;
    Ok(ApiResponse::ok(session))
}

async fn me(AuthUser(user): AuthUser) -> ApiResponse<user::Model> {
    ApiResponse::ok(user)
}

/// Routes that get the stricter auth rate limit.
pub fn limited_router() -> Router<AppState> {
    Router::new()
        .route("/signup", post(signup))
        .route("/signin", post(signin))
        .route("/reset-password/request", post(request_reset))
        .route("/reset-password", post(reset_password))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/confirm", post(confirm))
        .route("/signout", post(signout))
        .route("/change-password", post(change_password))
        .route("/me", get(me))
}
