use axum::{
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde_json::json;

use crate::services::{
    catalog_service::CatalogError,
    storage_service::{UploadError, UploadErrorReason},
    submission_store::PersistenceError,
    validation_service::ValidationError,
};

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Upload(#[from] UploadError),

    #[error(transparent)]
    Persistence(#[from] PersistenceError),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Multipart error: {0}")]
    Multipart(#[from] axum::extract::multipart::MultipartError),
}

impl Error {
    pub fn status(&self) -> StatusCode {
        match self {
            Error::BadRequest(_) | Error::Validation(_) | Error::Multipart(_) => {
                StatusCode::BAD_REQUEST
            }
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::Upload(err) => match err.reason {
                UploadErrorReason::BackendFailure => StatusCode::BAD_GATEWAY,
                _ => StatusCode::BAD_REQUEST,
            },
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> axum::response::Response {
        let status = self.status();
        let body = match self {
            Error::Validation(err) => json!({
                "error": err.message,
                "field": err.field,
                "reason": err.reason,
            }),
            Error::Upload(err) => json!({
                "error": err.user_message(),
                "reason": err.reason,
            }),
            Error::Persistence(err) => json!({ "error": err.user_message() }),
            Error::BadRequest(msg) | Error::NotFound(msg) => json!({ "error": msg }),
            Error::Multipart(_) => json!({ "error": "Invalid form submission." }),
            other => {
                tracing::error!(tag = "unexpected_error", error = %other, "Request failed");
                json!({ "error": "An unexpected error occurred. Please try again later." })
            }
        };
        (status, Json(body)).into_response()
    }
}
