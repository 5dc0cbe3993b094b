//! Disk-backed storage for uploaded item images.
//!
//! Files are written under a server-generated UUID filename (no user input
//! reaches the filesystem path) and served read-only under `/uploads/`.
//! Item records store only the relative path.

use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::ApiError;

/// URL prefix the upload directory is served under.
pub const UPLOADS_PREFIX: &str = "/uploads";

#[derive(Debug, Clone)]
pub struct UploadStore {
    base_path: PathBuf,
    max_size: usize,
}

impl UploadStore {
    pub async fn new(base_path: PathBuf, max_size: usize) -> Result<Self, ApiError> {
        fs::create_dir_all(&base_path).await.map_err(|e| {
            ApiError::UploadStorage(format!(
                "Failed to create upload directory '{}': {}",
                base_path.display(),
                e
            ))
        })?;

        info!(path = %base_path.display(), "Upload store initialized");

        Ok(Self {
            base_path,
            max_size,
        })
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Persist an uploaded image and return its relative URL path
    /// (`/uploads/<uuid>.<ext>`).
    pub async fn store_image(
        &self,
        data: &[u8],
        mime: Option<&str>,
    ) -> Result<String, ApiError> {
        if data.is_empty() {
            return Err(ApiError::BadRequest("Empty image upload".to_string()));
        }
        if data.len() > self.max_size {
            return Err(ApiError::UploadTooLarge {
                size: data.len(),
                max: self.max_size,
            });
        }

        let filename = format!("{}.{}", Uuid::new_v4(), extension_for(mime));
        let path = self.base_path.join(&filename);

        fs::write(&path, data).await.map_err(|e| {
            ApiError::UploadStorage(format!("Failed to write upload {}: {}", filename, e))
        })?;

        debug!(file = %filename, size = data.len(), "Stored uploaded image");
        Ok(format!("{UPLOADS_PREFIX}/{filename}"))
    }
}

/// File extension for a declared image MIME type.
fn extension_for(mime: Option<&str>) -> &'static str {
    match mime.unwrap_or("image/jpeg") {
        "image/jpeg" | "image/jpg" => "jpg",
        "image/png" => "png",
        "image/webp" => "webp",
        "image/gif" => "gif",
        _ => "bin",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn test_store() -> (UploadStore, TempDir) {
        let dir = TempDir::new().unwrap();
        let store = UploadStore::new(dir.path().to_path_buf(), 1024 * 1024)
            .await
            .unwrap();
        (store, dir)
    }

    #[tokio::test]
    async fn test_store_image() {
        let (store, dir) = test_store().await;

        let path = store
            .store_image(b"jpeg-bytes", Some("image/jpeg"))
            .await
            .unwrap();
        assert!(path.starts_with("/uploads/"));
        assert!(path.ends_with(".jpg"));

        let on_disk = dir.path().join(path.strip_prefix("/uploads/").unwrap());
        assert_eq!(std::fs::read(on_disk).unwrap(), b"jpeg-bytes");
    }

    #[tokio::test]
    async fn test_empty_upload_rejected() {
        let (store, _dir) = test_store().await;
        assert!(store.store_image(b"", Some("image/png")).await.is_err());
    }

    #[tokio::test]
    async fn test_oversized_upload_rejected() {
        let dir = TempDir::new().unwrap();
        let store = UploadStore::new(dir.path().to_path_buf(), 4).await.unwrap();

        let err = store
            .store_image(b"too big", Some("image/png"))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::UploadTooLarge { size: 7, max: 4 }));
    }

    #[test]
    fn test_extension_mapping() {
        assert_eq!(extension_for(Some("image/png")), "png");
        assert_eq!(extension_for(Some("image/webp")), "webp");
        assert_eq!(extension_for(Some("application/pdf")), "bin");
        // original frontend mostly uploads jpegs, so that is the default
        assert_eq!(extension_for(None), "jpg");
    }
}
