//! Booking and booking message endpoints.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, post},
};
use serde::Serialize;
use terapie_common::AppResult;
use terapie_core::{
    Availability, AvailabilityQuery, BookingDetail, BookingFilter, ClientBookingRow,
    CreateBookingInput, ProviderBookingRow, SendMessageInput, SentMessage, UpdateStatusInput,
};
use terapie_db::entities::{booking, booking_message};

use crate::{extractors::AuthUser, middleware::AppState, response::ApiResponse, sse};

#[derive(Debug, Serialize)]
pub struct ReadResponse {
    pub count: u64,
}

#[derive(Debug, Serialize)]
pub struct UnreadResponse {
    pub unread: u64,
}

/// Free slots for a provider or offer on a date.
async fn availability(
    State(state): State<AppState>,
    Query(query): Query<AvailabilityQuery>,
) -> AppResult<ApiResponse<Availability>> {
    let availability = state.availability_service.resolve(&query).await?;
    Ok(ApiResponse::ok(availability))
}

async fn create(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(input): Json<CreateBookingInput>,
) -> AppResult<ApiResponse<booking::Model>> {
    let booking = state.booking_service.create_booking(&user, input).await?;
    Ok(ApiResponse::created(booking))
}

/// Bookings made by the caller.
async fn list_client(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Query(filter): Query<BookingFilter>,
) -> AppResult<ApiResponse<Vec<ClientBookingRow>>> {
    let rows = state
        .booking_service
        .list_client_bookings(&user, &filter)
        .await?;
    Ok(ApiResponse::ok(rows))
}

/// Bookings received by the caller's provider profile.
async fn list_provider(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Query(filter): Query<BookingFilter>,
) -> AppResult<ApiResponse<Vec<ProviderBookingRow>>> {
    let rows = state
        .booking_service
        .list_provider_bookings(&user, &filter)
        .await?;
    Ok(ApiResponse::ok(rows))
}

async fn show(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<BookingDetail>> {
    let detail = state.booking_service.get_booking(&user, &id).await?;
    Ok(ApiResponse::ok(detail))
}

async fn update_status(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(input): Json<UpdateStatusInput>,
) -> AppResult<ApiResponse<booking::Model>> {
    let booking = state
        .booking_service
        .update_status(&user, &id, input)
        .await?;
    Ok(ApiResponse::ok(booking))
}

async fn list_messages(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<Vec<booking_message::Model>>> {
    let messages = state.messaging_service.list_messages(&user, &id).await?;
    Ok(ApiResponse::ok(messages))
}

async fn send_message(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(input): Json<SendMessageInput>,
) -> AppResult<ApiResponse<SentMessage>> {
    let message = state
        .messaging_service
        .send_message(&user, &id, input)
        .await?;
    Ok(ApiResponse::created(message))
}

async fn mark_read(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<ReadResponse>> {
    let count = state.messaging_service.mark_read(&user, &id).await?;
    Ok(ApiResponse::ok(ReadResponse { count }))
}

async fn unread(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<UnreadResponse>> {
    let unread = state.messaging_service.unread_count(&user, &id).await?;
    Ok(ApiResponse::ok(UnreadResponse { unread }))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_client).post(create))
        .route("/availability", get(availability))
        .route("/provider", get(list_provider))
        .route("/{id}", get(show))
        .route("/{id}/status", post(update_status))
        .route("/{id}/messages", get(list_messages).post(send_message))
        .route("/{id}/messages/read", post(mark_read))
        .route("/{id}/messages/unread", get(unread))
        .route("/{id}/events", get(sse::booking_events))
}
