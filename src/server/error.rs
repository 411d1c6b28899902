use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use roster::StoreError;

/// Failure of an /api route, rendered as the
/// `{"status": "error", "message": ...}` payload the API promises.
pub(crate) enum ApiError {
    Store(StoreError),
    Internal(anyhow::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (code, message) = match self {
            Self::Store(err) => match err {
                StoreError::UnknownId(id) => {
                    log::warn!("no user exists with id {}", id);
                    (
                        StatusCode::BAD_REQUEST,
                        format!("No user exists with ID : {}", id),
                    )
                }
                StoreError::DuplicateEmail(email) => {
                    log::warn!("{} already exists", email);
                    (
                        StatusCode::ALREADY_REPORTED,
                        "Email already exists".to_string(),
                    )
                }
                StoreError::EmptyBody(action) => {
                    log::warn!("no data provided for {}", action);
                    (
                        StatusCode::BAD_REQUEST,
                        format!("No data provided for {}", action),
                    )
                }
                StoreError::Persistence(source) => {
                    log::error!("failed to persist user data: {:#}", source);
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "Failed to save user data".to_string(),
                    )
                }
            },
            Self::Internal(err) => {
                log::error!("internal error: {:#}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal error".to_string(),
                )
            }
        };

        (code, Json(json!({ "status": "error", "message": message }))).into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        Self::Store(err)
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err)
    }
}
