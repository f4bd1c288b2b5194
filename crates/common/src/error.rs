use std::collections::BTreeMap;

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

use crate::types::NO_VALID_RECIPIENTS;

/// Field name → validation messages, rendered as the 400 response body.
pub type FieldErrors = BTreeMap<String, Vec<String>>;

/// Common error types used across the application.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Validation error: {}", summarize(.0))]
    Validation(FieldErrors),

    #[error("{}", NO_VALID_RECIPIENTS)]
    NoValidRecipients,

    #[error("Failed to save notification: {0}")]
    Persistence(String),

    #[error("Failed to schedule notification: {0}")]
    Scheduling(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Validation error for a single field.
    pub fn field(field: &str, message: impl Into<String>) -> Self {
        let mut errors = FieldErrors::new();
        errors.insert(field.to_string(), vec![message.into()]);
        AppError::Validation(errors)
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::NoValidRecipients => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Database(_)
            | AppError::Redis(_)
            | AppError::Serialization(_)
            | AppError::Persistence(_)
            | AppError::Scheduling(_)
            | AppError::Config(_)
            | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

fn summarize(errors: &FieldErrors) -> String {
    errors
        .iter()
        .map(|(field, messages)| format!("{}: {}", field, messages.join(" ")))
        .collect::<Vec<_>>()
        .join("; ")
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self {
            AppError::Validation(errors) => json!(errors),
            AppError::NoValidRecipients => json!([NO_VALID_RECIPIENTS]),
            AppError::NotFound(msg) => json!({ "error": msg }),
            _ => json!({ "error": self.to_string() }),
        };

        (status, Json(body)).into_response()
    }
}
