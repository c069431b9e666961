//! Profile photo storage under `{STORAGE_ROOT}/users/{user_id}/`.

use crate::service::{AppError, ServiceResult};
use chrono::Utc;
use std::io::ErrorKind;
use util::{config, paths};

const ALLOWED: &[(&str, &str)] = &[
    ("image/png", "png"),
    ("image/jpeg", "jpg"),
    ("image/gif", "gif"),
    ("image/webp", "webp"),
];

/// An uploaded image as received from a multipart form.
#[derive(Debug, Clone)]
pub struct PhotoUpload {
    pub content_type: Option<String>,
    pub file_name: Option<String>,
    pub bytes: Vec<u8>,
}

impl PhotoUpload {
    /// Checks type and size, returning the file extension to store under.
    ///
    /// The declared content type wins; the file name is the fallback.
    pub fn validate(&self) -> ServiceResult<&'static str> {
        if self.bytes.is_empty() {
            return Err(AppError::Validation("Photo is empty".into()));
        }
        let max = config::max_photo_bytes();
        if self.bytes.len() > max {
            return Err(AppError::Validation(format!(
                "Photo exceeds the {} byte limit",
                max
            )));
        }

        let declared = self
            .content_type
            .as_deref()
            .map(|ct| ct.split(';').next().unwrap_or(ct).trim().to_ascii_lowercase());
        let extension = declared
            .as_deref()
            .and_then(|ct| ALLOWED.iter().find(|(mime, _)| *mime == ct))
            .or_else(|| {
                let name = self.file_name.as_deref()?;
                let ext = std::path::Path::new(name).extension()?.to_str()?.to_ascii_lowercase();
                ALLOWED.iter().find(|(_, allowed)| {
                    *allowed == ext || (ext == "jpeg" && *allowed == "jpg")
                })
            })
            .map(|(_, ext)| *ext);

        extension.ok_or_else(|| {
            AppError::Validation("Photo must be a PNG, JPEG, GIF or WebP image".into())
        })
    }
}

pub struct PhotoStore;

impl PhotoStore {
    /// Writes the photo under a fresh name and returns its stored reference.
    ///
    /// A fresh name per upload means an existing photo is never overwritten before the
    /// new one is safely on disk.
    pub async fn store(user_id: i64, upload: &PhotoUpload) -> ServiceResult<String> {
        let extension = upload.validate()?;
        let file_name = format!("photo-{}.{}", Utc::now().timestamp_millis(), extension);
        let relative = paths::user_file_relative(user_id, &file_name);
        let absolute = paths::resolve_stored(&relative)
            .ok_or_else(|| AppError::Internal("Invalid photo path".into()))?;

        paths::ensure_parent_dir(&absolute)?;
        tokio::fs::write(&absolute, &upload.bytes).await?;
        tracing::info!(user_id, path = %relative, "Stored profile photo");
        Ok(relative)
    }

    /// Deletes a stored photo. A file that is already gone counts as success.
    pub async fn remove(relative: &str) -> ServiceResult<()> {
        let Some(absolute) = paths::resolve_stored(relative) else {
            tracing::warn!(path = %relative, "Refusing to delete photo outside storage root");
            return Ok(());
        };
        match tokio::fs::remove_file(&absolute).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!(path = %relative, "Photo already missing");
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// [`PhotoStore::remove`] for cleanup paths where failure must not fail the request.
    pub async fn remove_best_effort(relative: &str) {
        if let Err(e) = Self::remove(relative).await {
            tracing::warn!(path = %relative, error = %e, "Failed to delete old photo");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use util::test_helpers::setup_test_storage_root;

    fn upload(content_type: Option<&str>, name: Option<&str>, len: usize) -> PhotoUpload {
        PhotoUpload {
            content_type: content_type.map(str::to_owned),
            file_name: name.map(str::to_owned),
            bytes: vec![7; len],
        }
    }

    #[test]
    #[serial]
    fn validation_accepts_images_and_rejects_others() {
        config::AppConfig::set_max_photo_bytes(16);
        assert_eq!(upload(Some("image/png"), None, 4).validate().unwrap(), "png");
        assert_eq!(upload(None, Some("me.JPEG"), 4).validate().unwrap(), "jpg");
        assert!(upload(Some("application/pdf"), Some("cv.pdf"), 4).validate().is_err());
        assert!(upload(Some("image/png"), None, 17).validate().is_err());
        assert!(upload(Some("image/png"), None, 0).validate().is_err());
        config::AppConfig::set_max_photo_bytes(5 * 1024 * 1024);
    }

    #[tokio::test]
    #[serial]
    async fn store_then_remove_tolerates_missing_file() {
        let _root = setup_test_storage_root();
        let rel = PhotoStore::store(3, &upload(Some("image/gif"), None, 8))
            .await
            .unwrap();
        let abs = paths::resolve_stored(&rel).unwrap();
        assert!(abs.exists());

        PhotoStore::remove(&rel).await.unwrap();
        assert!(!abs.exists());
        PhotoStore::remove(&rel).await.unwrap();
    }
}
