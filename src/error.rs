use crate::orchestration::{ReconcileError, SubmissionError};
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Internal server error: {0}")]
    Internal(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Bad request: {0}")]
    BadRequest(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Unprocessable: {0}")]
    Unprocessable(String),
    #[error("Pick rejected: {}", .0.join("; "))]
    Rejected(Vec<String>),
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<ReconcileError> for AppError {
    fn from(err: ReconcileError) -> Self {
        match err {
            ReconcileError::NotFound(_) => AppError::NotFound(err.to_string()),
            ReconcileError::NotReady { .. } => AppError::Conflict(err.to_string()),
            ReconcileError::Ineligible { .. } | ReconcileError::DataInconsistency(_) => {
                AppError::Unprocessable(err.to_string())
            }
            ReconcileError::Db(e) => AppError::Internal(e.to_string()),
        }
    }
}

impl From<SubmissionError> for AppError {
    fn from(err: SubmissionError) -> Self {
        match err {
            SubmissionError::TournamentNotFound(_) | SubmissionError::UserNotFound(_) => {
                AppError::NotFound(err.to_string())
            }
            SubmissionError::Rejected(_) => {
                AppError::Rejected(err.violations().iter().map(|v| v.to_string()).collect())
            }
            SubmissionError::Db(e) => AppError::Internal(e.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if let AppError::Rejected(violations) = self {
            let body = Json(json!({
                "error": "pick rejected",
                "violations": violations,
            }));
            return (StatusCode::UNPROCESSABLE_ENTITY, body).into_response();
        }

        let (status, error_message) = match self {
            AppError::Config(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            AppError::Unprocessable(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg),
            AppError::Rejected(violations) => {
                (StatusCode::UNPROCESSABLE_ENTITY, violations.join("; "))
            }
        };

        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), error = %error_message, "Request failed");
        }

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}
