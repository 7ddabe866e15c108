use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::wizard::validators::ValidationError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
///
/// Validation errors never reach the operator through this type on the wizard
/// path: the engine turns them into a re-prompt. Everything else bubbles to the
/// desk, which reports `user_message()` and clears the session.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Persistence failure: {0}")]
    Persistence(String),

    #[error("Unknown record type: {0}")]
    UnknownRecordType(String),

    #[error("Unknown field: {0}")]
    UnknownField(String),

    #[error("Index {index} out of range for list of length {len}")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("Invalid session state: {0}")]
    InvalidState(String),

    #[error("Malformed record in '{field}' at position {index}")]
    MalformedRecord { field: String, index: usize },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Session backend error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Text shown to the operator in the chat when a flow ends with this error.
    pub fn user_message(&self) -> String {
        match self {
            AppError::Validation(e) => e.to_string(),
            AppError::NotFound(what) => format!("Not found: {what}"),
            AppError::IndexOutOfRange { .. } => "Invalid entry selection.".to_string(),
            AppError::MalformedRecord { field, index } => {
                format!("Stored {field} entry {} is malformed.", index + 1)
            }
            AppError::Persistence(_) | AppError::Database(_) => "Error updating data".to_string(),
            AppError::InvalidState(_) => {
                "This step is no longer active. Start again from the main menu.".to_string()
            }
            _ => "An internal error occurred".to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Validation(e) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", e.to_string()),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::UnknownRecordType(_)
            | AppError::UnknownField(_)
            | AppError::IndexOutOfRange { .. } => {
                (StatusCode::BAD_REQUEST, "CONTRACT_VIOLATION", self.to_string())
            }
            AppError::InvalidState(msg) => (StatusCode::CONFLICT, "INVALID_STATE", msg.clone()),
            AppError::MalformedRecord { .. } => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "MALFORMED_RECORD",
                self.to_string(),
            ),
            AppError::Persistence(msg) => {
                tracing::error!("Persistence failure: {msg}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "PERSISTENCE_ERROR",
                    "A storage error occurred".to_string(),
                )
            }
            AppError::Database(e) => {
                tracing::error!("Database error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "DATABASE_ERROR",
                    "A database error occurred".to_string(),
                )
            }
            AppError::Redis(e) => {
                tracing::error!("Session backend error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "SESSION_ERROR",
                    "A session storage error occurred".to_string(),
                )
            }
            AppError::Transport(msg) => {
                tracing::error!("Transport error: {msg}");
                (
                    StatusCode::BAD_GATEWAY,
                    "TRANSPORT_ERROR",
                    "The chat transport rejected the message".to_string(),
                )
            }
            AppError::Serde(e) => {
                tracing::error!("Serialization error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "SERIALIZATION_ERROR",
                    "A serialization error occurred".to_string(),
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
