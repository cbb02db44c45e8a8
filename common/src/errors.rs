//! Application error taxonomy.
//!
//! Every handler returns `AppResult<T>`; failures are converted into the
//! JSON envelope by the `IntoResponse` impl, so no error crosses the HTTP
//! boundary unconverted.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde_json::json;
use thiserror::Error;

/// Convenience alias for results carrying an [`AppError`].
pub type AppResult<T> = Result<T, AppError>;

/// Application error variants.
#[derive(Debug, Error)]
pub enum AppError {
    /// A required storage binding (database, redis, blob root) is missing.
    #[error("storage binding unavailable: {0}")]
    BindingUnavailable(String),

    /// A resource, key or blob object does not exist.
    #[error("{0}")]
    NotFound(String),

    /// A logical table name could not be resolved against the registry.
    #[error("unknown table or object: {name}")]
    TableNotFound {
        name: String,
        /// Candidate produced by the snake_case -> camelCase fallback, if
        /// it exists in the registry.
        suggestion: Option<String>,
        /// All valid logical names, for the error payload.
        valid_names: Vec<String>,
    },

    /// The request is malformed (missing header, empty body, bad params).
    #[error("{0}")]
    BadRequest(String),

    /// The relational store returned an error.
    #[error("database query failed: {0}")]
    Database(String),

    /// The key-value store returned an error.
    #[error("key-value operation failed: {0}")]
    Kv(String),

    /// The blob store returned an error.
    #[error("blob store operation failed: {0}")]
    Blob(String),

    /// Anything else, caught at the top level.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) | AppError::TableNotFound { .. } => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::BindingUnavailable(_)
            | AppError::Database(_)
            | AppError::Kv(_)
            | AppError::Blob(_)
            | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let mut body = json!({
            "success": false,
            "error": self.to_string(),
            "timestamp": Utc::now(),
        });

        // Resolution failures carry a best-effort suggestion and the list
        // of valid alternatives.
        if let AppError::TableNotFound {
            suggestion,
            valid_names,
            ..
        } = &self
        {
            if let Some(obj) = body.as_object_mut() {
                if let Some(s) = suggestion {
                    obj.insert("suggestion".into(), json!(s));
                }
                obj.insert("validNames".into(), json!(valid_names));
            }
        }

        if status.is_server_error() {
            tracing::error!(status = %status, error = %self, "request failed");
        }

        (status, Json(body)).into_response()
    }
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        AppError::Database(e.to_string())
    }
}

impl From<redis::RedisError> for AppError {
    fn from(e: redis::RedisError) -> Self {
        AppError::Kv(e.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(e: std::io::Error) -> Self {
        AppError::Blob(e.to_string())
    }
}
