use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use lostfound_store::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(&'static str),

    #[error("Upload too large: {size} bytes (max {max})")]
    UploadTooLarge { size: usize, max: usize },

    #[error("Upload storage error: {0}")]
    UploadStorage(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, self.to_string()),
            ApiError::Unauthorized(_) => (StatusCode::UNAUTHORIZED, self.to_string()),
            ApiError::UploadTooLarge { .. } => (StatusCode::PAYLOAD_TOO_LARGE, self.to_string()),
            ApiError::UploadStorage(detail) => {
                tracing::error!(error = %detail, "upload storage failure");
                (StatusCode::INTERNAL_SERVER_ERROR, "Server error".to_string())
            }
            ApiError::Internal(detail) => {
                tracing::error!(error = %detail, "internal failure");
                (StatusCode::INTERNAL_SERVER_ERROR, "Server error".to_string())
            }
            ApiError::Store(store) => match store {
                StoreError::NotFound => (StatusCode::NOT_FOUND, "Not found".to_string()),
                StoreError::InvalidFloor(_)
                | StoreError::InvalidInput(_)
                | StoreError::InvalidIndex { .. } => {
                    (StatusCode::BAD_REQUEST, store.to_string())
                }
                other => {
                    // store/I-O detail stays server-side, the client gets a
                    // generic message
                    tracing::error!(error = %other, "store failure");
                    (StatusCode::INTERNAL_SERVER_ERROR, "Server error".to_string())
                }
            },
        };

        let body = serde_json::json!({
            "error": message,
        });

        (status, axum::Json(body)).into_response()
    }
}
