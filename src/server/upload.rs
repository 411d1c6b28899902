use std::path::Path;

use axum::{
    extract::{
        multipart::{Multipart, MultipartError},
        State,
    },
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use chrono::Utc;

use crate::routes::AppState;

const MAX_FILE_BYTES: usize = 1_000_000; // 1 MB
const ALLOWED_EXTENSIONS: [&str; 3] = ["jpeg", "jpg", "png"];
const ALLOWED_MIME_TYPES: [&str; 2] = ["image/jpeg", "image/png"];

pub(crate) enum UploadError {
    NoFile,
    UnsupportedType,
    TooLarge,
    Malformed(MultipartError),
    Io(std::io::Error),
}

impl IntoResponse for UploadError {
    fn into_response(self) -> Response {
        match self {
            Self::NoFile => (StatusCode::BAD_REQUEST, "Error: No file uploaded").into_response(),
            Self::UnsupportedType => (
                StatusCode::BAD_REQUEST,
                "Error: File upload only supports the following filetypes: jpeg, jpg, png",
            )
                .into_response(),
            Self::TooLarge => {
                (StatusCode::BAD_REQUEST, "File size limit exceeded (1MB max)").into_response()
            }
            Self::Malformed(err) => {
                log::warn!("malformed upload: {}", err);
                (StatusCode::BAD_REQUEST, "Error: malformed multipart body").into_response()
            }
            Self::Io(err) => {
                log::error!("failed to store upload: {}", err);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response()
            }
        }
    }
}

/// Accepts a single `profileImage` part, filters it by extension and MIME
/// type, caps the size at 1 MB and writes it under a timestamp-prefixed
/// name so repeated uploads of the same file never collide.
pub(crate) async fn upload_profile_image(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Redirect, UploadError> {
    while let Some(field) = multipart.next_field().await.map_err(UploadError::Malformed)? {
        if field.name() != Some("profileImage") {
            continue;
        }

        // Client-supplied name; keep only the final path component.
        let original = field
            .file_name()
            .and_then(|name| Path::new(name).file_name())
            .and_then(|name| name.to_str())
            .unwrap_or_default()
            .to_owned();
        if original.is_empty() {
            return Err(UploadError::NoFile);
        }

        let content_type = field.content_type().map(str::to_owned);
        if !extension_allowed(&original) || !mime_allowed(content_type.as_deref()) {
            return Err(UploadError::UnsupportedType);
        }

        let data = field.bytes().await.map_err(UploadError::Malformed)?;
        if data.len() > MAX_FILE_BYTES {
            return Err(UploadError::TooLarge);
        }

        let destination = state
            .upload_dir
            .join(format!("{}-{}", Utc::now().timestamp_millis(), original));
        tokio::fs::write(&destination, &data)
            .await
            .map_err(UploadError::Io)?;
        log::info!("stored upload {}", destination.display());

        return Ok(Redirect::to("/"));
    }

    Err(UploadError::NoFile)
}

fn extension_allowed(file_name: &str) -> bool {
    Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ALLOWED_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

fn mime_allowed(content_type: Option<&str>) -> bool {
    content_type
        .map(|value| ALLOWED_MIME_TYPES.contains(&value))
        .unwrap_or(false)
}
