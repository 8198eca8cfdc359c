//! Image upload endpoint.

use axum::{
    Router,
    extract::{Multipart, Path, State},
    routing::post,
};
use serde::Serialize;
use terapie_common::{AppError, AppResult};

use crate::{extractors::AuthUser, middleware::AppState, response::ApiResponse};

/// Stored upload.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub url: String,
    pub key: String,
    pub size: u64,
    pub content_type: String,
}

/// Upload the multipart `file` field into a bucket.
async fn upload(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(bucket): Path<String>,
    mut multipart: Multipart,
) -> AppResult<ApiResponse<UploadResponse>> {
    let mut file: Option<(String, String, Vec<u8>)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let file_name = field.file_name().unwrap_or("upload").to_string();
        let content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(e.to_string()))?
            .to_vec();
        file = Some((file_name, content_type, data));
    }

    let (file_name, content_type, data) =
        file.ok_or_else(|| AppError::BadRequest("No file provided".to_string()))?;

    let stored = state
        .upload_service
        .upload(&user, &bucket, &file_name, &content_type, &data)
        .await?;

    Ok(ApiResponse::created(UploadResponse {
        url: stored.url,
        key: stored.key,
        size: stored.size,
        content_type: stored.content_type,
    }))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/{bucket}", post(upload))
}
