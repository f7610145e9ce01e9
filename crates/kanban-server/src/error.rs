use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use kanban_shared::policy::Denial;
use kanban_shared::validation::{ValidationErrors, NON_FIELD_ERRORS};
use serde_json::json;

use crate::store::StoreError;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Authentication credentials were not provided or are invalid")]
    Unauthorized,

    #[error("You do not have permission to perform this action")]
    Forbidden,

    #[error("Not found")]
    NotFound,

    #[error("Validation error: {0}")]
    Validation(ValidationErrors),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<ValidationErrors> for AppError {
    fn from(errors: ValidationErrors) -> Self {
        AppError::Validation(errors)
    }
}

impl From<Denial> for AppError {
    fn from(denial: Denial) -> Self {
        tracing::debug!("Access decision: {}", denial);
        match denial {
            Denial::Forbidden => AppError::Forbidden,
            Denial::NotFound => AppError::NotFound,
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Validation(ValidationErrors::single(NON_FIELD_ERRORS, rejection.body_text()))
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::Validation(ValidationErrors::single(NON_FIELD_ERRORS, rejection.body_text()))
    }
}

/// A path id that does not parse cannot name an existing resource.
impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        tracing::debug!("Rejected path: {}", rejection.body_text());
        AppError::NotFound
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let message = self.to_string();
        let (status, message) = match self {
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, message),
            AppError::Forbidden => (StatusCode::FORBIDDEN, message),
            AppError::NotFound => (StatusCode::NOT_FOUND, message),
            AppError::Validation(errors) => {
                return (StatusCode::BAD_REQUEST, Json(errors)).into_response();
            }
            AppError::Store(StoreError::MissingParent(parent)) => {
                tracing::debug!("Write lost its {} to a concurrent delete", parent);
                (StatusCode::NOT_FOUND, "Not found".to_string())
            }
            AppError::Store(StoreError::Conflict(msg)) => (StatusCode::CONFLICT, msg),
            AppError::Store(e) => {
                tracing::error!("Store error: {:?}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Database error".to_string())
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {:?}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal error".to_string())
            }
        };

        let body = Json(json!({
            "error": message
        }));

        (status, body).into_response()
    }
}
