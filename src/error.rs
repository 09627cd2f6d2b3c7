//! Error types for the data, upload and mail layers, and their mapping to
//! HTTP responses.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::routes::ErrorResponse;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{0} not found")]
    NotFound(String),

    /// A singleton row that provisioning should have created is missing.
    #[error("{0} has not been provisioned")]
    NotProvisioned(&'static str),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("no file provided")]
    MissingFile,

    #[error("file must be an image, got {0}")]
    NotAnImage(String),

    #[error("empty file")]
    Empty,

    #[error("file of {0} bytes exceeds the upload limit")]
    TooLarge(usize),

    #[error("invalid multipart data: {0}")]
    Multipart(#[from] axum::extract::multipart::MultipartError),

    #[error("storage io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("storage request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("storage rejected upload with status {0}")]
    Rejected(u16),
}

#[derive(Debug, Error)]
pub enum MailError {
    #[error("SMTP credentials are not configured")]
    NotConfigured,

    #[error("invalid email address: {0}")]
    InvalidAddress(#[from] lettre::address::AddressError),

    #[error("failed to build message: {0}")]
    Build(#[from] lettre::error::Error),

    #[error("SMTP transport error: {0}")]
    Transport(#[from] lettre::transport::smtp::Error),
}

/// Errors as seen by the HTTP boundary. Everything the browser sees is a
/// status plus a short string.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unauthorized(&'static str),

    #[error("{0}")]
    NotFound(String),

    /// Logged in full; the client only gets the public message.
    #[error("{public}: {detail}")]
    Internal { public: &'static str, detail: String },
}

impl ApiError {
    pub fn internal(public: &'static str, err: impl std::fmt::Display) -> Self {
        ApiError::Internal {
            public,
            detail: err.to_string(),
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(what) => ApiError::NotFound(format!("{} not found", what)),
            other => ApiError::internal("Database operation failed", other),
        }
    }
}

impl From<UploadError> for ApiError {
    fn from(err: UploadError) -> Self {
        match err {
            UploadError::MissingFile => ApiError::BadRequest("No file provided".to_string()),
            UploadError::NotAnImage(_) => ApiError::BadRequest("File must be an image".to_string()),
            UploadError::Empty => ApiError::BadRequest("Empty file".to_string()),
            UploadError::TooLarge(_) => {
                ApiError::BadRequest("File size must be less than 5MB".to_string())
            }
            UploadError::Multipart(_) => {
                ApiError::BadRequest("Invalid multipart data".to_string())
            }
            other => ApiError::internal("Failed to upload file", other),
        }
    }
}

/// Visitor input is validated before the mailer runs, so every mail failure
/// is a server-side problem.
impl From<MailError> for ApiError {
    fn from(err: MailError) -> Self {
        ApiError::internal("Failed to send message, please try again later", err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg.to_string()),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::Internal { public, detail } => {
                tracing::error!(error = %detail, "{}", public);
                (StatusCode::INTERNAL_SERVER_ERROR, public.to_string())
            }
        };

        (
            status,
            Json(ErrorResponse {
                error,
                message: None,
            }),
        )
            .into_response()
    }
}
