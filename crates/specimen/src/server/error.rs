//! Request-level errors rendered as HTML pages.

use axum::extract::multipart::MultipartError;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use specimen_core::StoreError;

use super::templates;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Upload too large")]
    PayloadTooLarge,

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Template error: {0}")]
    Template(String),
}

impl From<tera::Error> for AppError {
    fn from(e: tera::Error) -> Self {
        // Debug output includes the failing template and its cause chain.
        AppError::Template(format!("{e:?}"))
    }
}

impl From<MultipartError> for AppError {
    fn from(e: MultipartError) -> Self {
        if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
            AppError::PayloadTooLarge
        } else {
            AppError::BadRequest(e.body_text())
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::PayloadTooLarge => (
                StatusCode::PAYLOAD_TOO_LARGE,
                "That photo is too large to upload.".to_string(),
            ),
            AppError::Store(StoreError::NotFound(what)) => {
                (StatusCode::NOT_FOUND, format!("{what} not found"))
            }
            AppError::Store(e) => {
                tracing::error!("Store failure: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "The observation could not be saved.".to_string(),
                )
            }
            AppError::Template(msg) => {
                tracing::error!("Template error: {msg}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };
        match templates::pages().ok().and_then(|pages| pages.error(&message).ok()) {
            Some(page) => (status, Html(page)).into_response(),
            None => (status, message).into_response(),
        }
    }
}
