//! Image uploads into the public storage buckets.

use std::sync::Arc;

use terapie_common::{
    AppError, AppResult, StorageBackend, StorageSettings, UploadedFile, generate_storage_key,
};
use terapie_db::entities::user;
use tracing::info;

/// Buckets accepted by [`UploadService::upload`].
pub const BUCKETS: [&str; 3] = ["profile-photos", "article-images", "offer-images"];

/// Accepted image content types.
pub const IMAGE_TYPES: [&str; 4] = ["image/jpeg", "image/png", "image/gif", "image/webp"];

/// Upload service.
#[derive(Clone)]
pub struct UploadService {
    storage: Arc<dyn StorageBackend>,
    max_upload_size: usize,
}

impl UploadService {
    #[must_use]
    pub fn new(storage: Arc<dyn StorageBackend>, settings: &StorageSettings) -> Self {
        Self {
            storage,
            max_upload_size: settings.max_upload_size,
        }
    }

    #[must_use]
    pub const fn max_upload_size(&self) -> usize {
        self.max_upload_size
    }

    /// Store an image and return where it is served from.
    pub async fn upload(
        &self,
        owner: &user::Model,
        bucket: &str,
        file_name: &str,
        content_type: &str,
        data: &[u8],
    ) -> AppResult<UploadedFile> {
        if !BUCKETS.contains(&bucket) {
            return Err(AppError::BadRequest(format!("Unknown bucket: {bucket}")));
        }
        // Parameters such as "; charset=" are not part of the media type.
        let media_type = content_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();
        if !IMAGE_TYPES.contains(&media_type.as_str()) {
            return Err(AppError::BadRequest(format!(
                "Unsupported file type: {content_type}"
            )));
        }
        if data.is_empty() {
            return Err(AppError::BadRequest("File is empty".to_string()));
        }
        if data.len() > self.max_upload_size {
            return Err(AppError::PayloadTooLarge(format!(
                "File exceeds {} bytes",
                self.max_upload_size
            )));
        }

        let key = generate_storage_key(bucket, &owner.id, file_name);
        let file = self.storage.upload(&key, data, &media_type).await?;

        info!(user = %owner.id, bucket, key = %file.key, size = file.size, "File uploaded");
        Ok(file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::test_fixtures::user_model;
    use terapie_common::LocalStorage;
    use terapie_db::entities::user::UserRole;

    fn service(dir: &std::path::Path, max: usize) -> UploadService {
        let settings = StorageSettings {
            base_path: dir.to_path_buf(),
            base_url: "/files".to_string(),
            max_upload_size: max,
        };
        UploadService::new(Arc::new(LocalStorage::from_settings(&settings)), &settings)
    }

    fn temp_dir() -> std::path::PathBuf {
        std::env::temp_dir().join(format!("terapie-upload-{}", uuid::Uuid::new_v4()))
    }

    #[tokio::test]
    async fn test_upload_stores_image() {
        let dir = temp_dir();
        let service = service(&dir, 1024);
        let owner = user_model("u1", UserRole::Therapist);

        let file = service
            .upload(&owner, "profile-photos", "me.PNG", "image/png", b"png-bytes")
            .await
            .unwrap();

        assert!(file.url.starts_with("/files/profile-photos/"));
        assert!(file.key.ends_with(".png"));
        assert_eq!(file.content_type, "image/png");

        let _ = tokio::fs::remove_dir_all(dir).await;
    }

    #[tokio::test]
    async fn test_upload_rejects_bad_input() {
        let dir = temp_dir();
        let service = service(&dir, 4);
        let owner = user_model("u1", UserRole::Client);

        assert!(matches!(
            service.upload(&owner, "documents", "a.png", "image/png", b"x").await,
            Err(AppError::BadRequest(_))
        ));
        assert!(matches!(
            service.upload(&owner, "offer-images", "a.pdf", "application/pdf", b"x").await,
            Err(AppError::BadRequest(_))
        ));
        assert!(matches!(
            service.upload(&owner, "offer-images", "a.png", "image/png", b"").await,
            Err(AppError::BadRequest(_))
        ));
        assert!(matches!(
            service.upload(&owner, "offer-images", "a.png", "image/png", b"too-big").await,
            Err(AppError::PayloadTooLarge(_))
        ));
    }
}
