//! Back-office endpoints. Every handler requires the admin role.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, post},
};
use serde::Deserialize;
use terapie_common::AppResult;
use terapie_core::{
    AdminCreateUserInput, ApplicationFilter, ApprovalOutcome, ArticleFilter, ContactReplyInput,
    CreateArticleInput, CreatedUser, DashboardStats, EmailDeliveryResult, RequestInfoInput,
    UpdateArticleInput, UserFilter,
};
use terapie_db::entities::{
    article,
    contact_submission::{self, SubmissionStatus},
    provider_application,
    user::{self, UserRole},
};

use crate::{
    extractors::AdminUser,
    middleware::AppState,
    response::{Ack, ApiResponse},
};

#[derive(Debug, Default, Deserialize)]
pub struct RejectRequest {
    pub reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RoleRequest {
    pub role: UserRole,
}

#[derive(Debug, Deserialize)]
pub struct ContactStatusRequest {
    pub status: SubmissionStatus,
}

#[derive(Debug, Default, Deserialize)]
pub struct ContactQuery {
    pub status: Option<SubmissionStatus>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

// Applications

async fn list_applications(
    AdminUser(_): AdminUser,
    State(state): State<AppState>,
    Query(filter): Query<ApplicationFilter>,
) -> AppResult<ApiResponse<Vec<provider_application::Model>>> {
    let applications = state.approval_service.list_applications(&filter).await?;
    Ok(ApiResponse::ok(applications))
}

async fn get_application(
    AdminUser(_): AdminUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<provider_application::Model>> {
    let application = state.approval_service.get_application(&id).await?;
    Ok(ApiResponse::ok(application))
}

async fn approve_application(
    AdminUser(admin): AdminUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<ApprovalOutcome>> {
    let outcome = state.approval_service.approve(&admin, &id).await?;
    Ok(ApiResponse::ok(outcome))
}

async fn reject_application(
    AdminUser(admin): AdminUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<RejectRequest>,
) -> AppResult<ApiResponse<provider_application::Model>> {
    let application = state
        .approval_service
        .reject(&admin, &id, req.reason)
        .await?;
    Ok(ApiResponse::ok(application))
}

async fn request_info(
    AdminUser(_): AdminUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(input): Json<RequestInfoInput>,
) -> AppResult<ApiResponse<EmailDeliveryResult>> {
    let result = state.approval_service.request_info(&id, input).await?;
    Ok(ApiResponse::ok(result))
}

// Users

async fn list_users(
    AdminUser(_): AdminUser,
    State(state): State<AppState>,
    Query(filter): Query<UserFilter>,
) -> AppResult<ApiResponse<Vec<user::Model>>> {
    let users = state.admin_service.list_users(&filter).await?;
    Ok(ApiResponse::ok(users))
}

async fn get_user(
    AdminUser(_): AdminUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<user::Model>> {
    let user = state.admin_service.get_user(&id).await?;
    Ok(ApiResponse::ok(user))
}

async fn create_user(
    AdminUser(_): AdminUser,
    State(state): State<AppState>,
    Json(input): Json<AdminCreateUserInput>,
) -> AppResult<ApiResponse<CreatedUser>> {
    let created = state.admin_service.create_user(input).await?;
    Ok(ApiResponse::created(created))
}

async fn change_role(
    AdminUser(admin): AdminUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<RoleRequest>,
) -> AppResult<ApiResponse<user::Model>> {
    let user = state.admin_service.change_role(&admin, &id, req.role).await?;
    Ok(ApiResponse::ok(user))
}

async fn delete_user(
    AdminUser(admin): AdminUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<Ack>> {
    state.admin_service.delete_user(&admin, &id).await?;
    Ok(Ack::ok())
}

// Contact submissions

async fn list_contacts(
    AdminUser(_): AdminUser,
    State(state): State<AppState>,
    Query(query): Query<ContactQuery>,
) -> AppResult<ApiResponse<Vec<contact_submission::Model>>> {
    let contacts = state
        .contact_service
        .list_contacts(query.status, query.limit, query.offset)
        .await?;
    Ok(ApiResponse::ok(contacts))
}

async fn update_contact_status(
    AdminUser(_): AdminUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<ContactStatusRequest>,
) -> AppResult<ApiResponse<contact_submission::Model>> {
    let contact = state
        .contact_service
        .update_contact_status(&id, req.status)
        .await?;
    Ok(ApiResponse::ok(contact))
}

async fn reply_contact(
    AdminUser(_): AdminUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(input): Json<ContactReplyInput>,
) -> AppResult<ApiResponse<contact_submission::Model>> {
    let contact = state.contact_service.reply_contact(&id, input).await?;
    Ok(ApiResponse::ok(contact))
}

// Articles

async fn list_articles(
    AdminUser(_): AdminUser,
    State(state): State<AppState>,
    Query(filter): Query<ArticleFilter>,
) -> AppResult<ApiResponse<Vec<article::Model>>> {
    let articles = state.article_service.list_all_articles(&filter).await?;
    Ok(ApiResponse::ok(articles))
}

async fn get_article(
    AdminUser(_): AdminUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<article::Model>> {
    let article = state.article_service.get_article(&id).await?;
    Ok(ApiResponse::ok(article))
}

async fn create_article(
    AdminUser(_): AdminUser,
    State(state): State<AppState>,
    Json(input): Json<CreateArticleInput>,
) -> AppResult<ApiResponse<article::Model>> {
    let article = state.article_service.create_article(input).await?;
    Ok(ApiResponse::created(article))
}

async fn update_article(
    AdminUser(_): AdminUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(input): Json<UpdateArticleInput>,
) -> AppResult<ApiResponse<article::Model>> {
    let article = state.article_service.update_article(&id, input).await?;
    Ok(ApiResponse::ok(article))
}

async fn delete_article(
    AdminUser(_): AdminUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<Ack>> {
    state.article_service.delete_article(&id).await?;
    Ok(Ack::ok())
}

async fn stats(
    AdminUser(_): AdminUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<DashboardStats>> {
    let stats = state.admin_service.stats().await?;
    Ok(ApiResponse::ok(stats))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/applications", get(list_applications))
        .route("/applications/{id}", get(get_application))
        .route("/applications/{id}/approve", post(approve_application))
        .route("/applications/{id}/reject", post(reject_application))
        .route("/applications/{id}/request-info", post(request_info))
        .route("/users", get(list_users).post(create_user))
        .route("/users/{id}", get(get_user).delete(delete_user))
        .route("/users/{id}/role", post(change_role))
        .route("/contacts", get(list_contacts))
        .route("/contacts/{id}/status", post(update_contact_status))
        .route("/contacts/{id}/reply", post(reply_contact))
        .route("/articles", get(list_articles).post(create_article))
        .route(
            "/articles/{id}",
            get(get_article).patch(update_article).delete(delete_article),
        )
        .route("/stats", get(stats))
}
