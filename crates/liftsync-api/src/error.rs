use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Invalid request: {0}")]
    BadRequest(String),
    #[error("Unauthorized: {0}")]
    Unauthorized(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Invalid document: {0}")]
    Unprocessable(String),
    #[error("Internal server error: {0}")]
    Internal(String),
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

impl AppError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized(message.into())
    }

    pub fn unprocessable(message: impl Into<String>) -> Self {
        Self::Unprocessable(message.into())
    }

    pub const fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Unprocessable(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<StoreError> for AppError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::OwnerMismatch { .. } => Self::Conflict(error.to_string()),
            StoreError::LibSql(_) | StoreError::Storage(_) => {
                tracing::error!(%error, "Document store failure");
                Self::Internal("document store unavailable".to_string())
            }
        }
    }
}

impl From<libsql::Error> for AppError {
    fn from(error: libsql::Error) -> Self {
        StoreError::from(error).into()
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = ErrorBody {
            error: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn owner_mismatch_maps_to_conflict() {
        let error = AppError::from(StoreError::OwnerMismatch {
            id: "e1".to_string(),
        });
        assert_eq!(error.status(), StatusCode::CONFLICT);
        assert!(error.to_string().contains("e1"));
    }

    #[test]
    fn storage_failures_hide_details() {
        let error = AppError::from(StoreError::Storage("disk /var/secret full".to_string()));
        assert_eq!(error.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!error.to_string().contains("/var/secret"));
    }

    #[test]
    fn validation_errors_are_unprocessable() {
        let response = AppError::unprocessable("owner_id must not be empty").into_response();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }
}
