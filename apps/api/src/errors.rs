use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::interview::InterviewError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid session state: {0}")]
    InvalidSessionState(String),

    #[error("Speech error: {0}")]
    Speech(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<InterviewError> for AppError {
    fn from(err: InterviewError) -> Self {
        match err {
            InterviewError::InvalidSessionState { .. } => {
                AppError::InvalidSessionState(err.to_string())
            }
            InterviewError::EmptyRole => AppError::Validation(err.to_string()),
            other => AppError::Internal(other.into()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::InvalidSessionState(msg) => (
                StatusCode::CONFLICT,
                "INVALID_SESSION_STATE",
                msg.clone(),
            ),
            AppError::Speech(msg) => {
                tracing::warn!("Speech error: {msg}");
                (
                    StatusCode::BAD_GATEWAY,
                    "SPEECH_ERROR",
                    "Speech synthesis is unavailable".to_string(),
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interview_errors_map_to_status() {
        let conflict: AppError = InterviewError::InvalidSessionState {
            expected: "awaiting an answer".to_string(),
            actual: "complete".to_string(),
        }
        .into();
        assert_eq!(conflict.into_response().status(), StatusCode::CONFLICT);

        let blank: AppError = InterviewError::EmptyRole.into();
        assert_eq!(blank.into_response().status(), StatusCode::BAD_REQUEST);

        let other: AppError = InterviewError::GenerationFailed("boom".to_string()).into();
        assert_eq!(
            other.into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_speech_error_is_bad_gateway() {
        let err = AppError::Speech("voice unavailable".to_string());
        assert_eq!(err.into_response().status(), StatusCode::BAD_GATEWAY);
    }
}
