//! Offer endpoints.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::get,
};
use terapie_common::AppResult;
use terapie_core::{CreateOfferInput, OfferFilter, UpdateOfferInput};
use terapie_db::entities::offer;

use crate::{
    extractors::{AuthUser, MaybeAuthUser},
    middleware::AppState,
    response::{Ack, ApiResponse},
};

async fn list(
    State(state): State<AppState>,
    Query(filter): Query<OfferFilter>,
) -> AppResult<ApiResponse<Vec<offer::Model>>> {
    let offers = state.offer_service.list_offers(filter).await?;
    Ok(ApiResponse::ok(offers))
}

/// The caller's own offers, inactive ones included.
async fn mine(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<Vec<offer::Model>>> {
    let offers = state.offer_service.list_own_offers(&user).await?;
    Ok(ApiResponse::ok(offers))
}

async fn show(
    MaybeAuthUser(viewer): MaybeAuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<offer::Model>> {
    let offer = state.offer_service.get_offer(&id, viewer.as_ref()).await?;
    Ok(ApiResponse::ok(offer))
}

async fn create(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(input): Json<CreateOfferInput>,
) -> AppResult<ApiResponse<offer::Model>> {
    let offer = state.offer_service.create_offer(&user, input).await?;
    Ok(ApiResponse::created(offer))
}

async fn update(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(input): Json<UpdateOfferInput>,
) -> AppResult<ApiResponse<offer::Model>> {
    let offer = state.offer_service.update_offer(&user, &id, input).await?;
    Ok(ApiResponse::ok(offer))
}

async fn remove(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<Ack>> {
    state.offer_service.delete_offer(&user, &id).await?;
    Ok(Ack::ok())
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list).post(create))
        .route("/mine", get(mine))
        .route("/{id}", get(show).patch(update).delete(remove))
}
