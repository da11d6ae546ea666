//! Typed errors and HTTP mapping.

use crate::response::Message;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    /// Reading or writing a named property during a selective update failed.
    /// Carries the property name and the underlying detail; the whole update aborts.
    #[error("property access '{property}': {detail}")]
    PropertyAccess { property: String, detail: String },
    /// Decode met a symbol outside the configured alphabet.
    #[error("invalid digit '{0}'")]
    InvalidDigit(char),
    #[error("not found: {0}")]
    NotFound(String),
    /// A query expected at most one row and matched more.
    #[error("non-unique result: {0}")]
    NonUnique(String),
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("mapping: {0}")]
    Mapping(#[from] serde_json::Error),
    #[error("database: {0}")]
    Db(#[from] sqlx::Error),
}

impl AppError {
    pub fn property(property: impl Into<String>, detail: impl Into<String>) -> Self {
        AppError::PropertyAccess {
            property: property.into(),
            detail: detail.into(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::PropertyAccess { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::InvalidDigit(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::NonUnique(_) => StatusCode::CONFLICT,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Mapping(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Db(e) => {
                if let sqlx::Error::RowNotFound = e {
                    StatusCode::NOT_FOUND
                } else {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            }
        };
        (status, Json(Message::fail(self.to_string()))).into_response()
    }
}
