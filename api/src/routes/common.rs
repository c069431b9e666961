//! Helpers shared by route handlers.

use crate::response::{ApiError, ApiResult};
use axum::extract::Multipart;
use services::photo::PhotoUpload;
use services::service::AppError;
use std::collections::HashMap;
use util::config;

/// Multipart part names accepted for a profile photo.
const PHOTO_FIELDS: &[&str] = &["photo", "file", "avatar"];

/// Request body ceiling for routes that accept a photo.
pub fn upload_body_limit() -> usize {
    config::max_photo_bytes() + 1024 * 1024
}

/// A `multipart/form-data` body split into text fields and an optional photo.
#[derive(Debug, Default)]
pub struct FormData {
    fields: HashMap<String, String>,
    pub photo: Option<PhotoUpload>,
}

impl FormData {
    pub async fn read(mut multipart: Multipart) -> ApiResult<Self> {
        let mut form = FormData::default();
        while let Some(field) = multipart.next_field().await.map_err(malformed)? {
            let Some(name) = field.name().map(str::to_owned) else {
                continue;
            };

            if PHOTO_FIELDS.contains(&name.as_str()) {
                let file_name = field.file_name().map(str::to_owned);
                let content_type = field.content_type().map(str::to_owned).or_else(|| {
                    file_name
                        .as_deref()
                        .and_then(|n| mime_guess::from_path(n).first())
                        .map(|m| m.essence_str().to_owned())
                });
                let bytes = field.bytes().await.map_err(malformed)?;
                // Browsers send an empty part when no file was chosen.
                if bytes.is_empty() && file_name.as_deref().is_none_or(str::is_empty) {
                    continue;
                }
                form.photo = Some(PhotoUpload {
                    content_type,
                    file_name,
                    bytes: bytes.to_vec(),
                });
            } else {
                let value = field.text().await.map_err(malformed)?;
                form.fields.insert(name, value);
            }
        }
        Ok(form)
    }

    /// First non-empty trimmed value among `keys`.
    pub fn text(&self, keys: &[&str]) -> Option<String> {
        keys.iter()
            .filter_map(|k| self.fields.get(*k))
            .map(|v| v.trim())
            .find(|v| !v.is_empty())
            .map(str::to_owned)
    }

    /// Raw value among `keys`, even when empty. Lets callers tell "cleared" from "absent".
    pub fn present(&self, keys: &[&str]) -> Option<Option<String>> {
        keys.iter()
            .find_map(|k| self.fields.get(*k))
            .map(|v| Some(v.trim().to_owned()).filter(|v| !v.is_empty()))
    }

    pub fn required(&self, keys: &[&str], label: &str) -> ApiResult<String> {
        self.text(keys)
            .ok_or_else(|| AppError::Validation(format!("{label} is required")).into())
    }

    pub fn flag(&self, keys: &[&str]) -> bool {
        self.text(keys)
            .is_some_and(|v| matches!(v.to_ascii_lowercase().as_str(), "true" | "1" | "on" | "yes"))
    }
}

fn malformed(e: axum::extract::multipart::MultipartError) -> ApiError {
    AppError::Validation(format!("Malformed form data: {}", e.body_text())).into()
}
