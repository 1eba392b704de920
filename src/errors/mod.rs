//! Unified error handling and the JSON error body returned to the dashboard.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Error body returned for every failed request.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    pub message: String,
}

impl ErrorBody {
    pub fn new(error: &str, message: &str) -> Self {
        Self {
            error: error.to_string(),
            message: message.to_string(),
        }
    }
}

/// Application error type mapping to HTTP status codes.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Query failed for metric {metric}: {source}")]
    QueryFailure {
        metric: &'static str,
        #[source]
        source: sqlx::Error,
    },

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Wrap a database error with the name of the metric being computed.
    pub fn query(metric: &'static str) -> impl FnOnce(sqlx::Error) -> Self {
        move |source| Self::QueryFailure { metric, source }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error, message) = match &self {
            AppError::QueryFailure { metric, source } => {
                tracing::error!(metric, error = %source, "Aggregate query failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Server error",
                    format!("Failed to load {metric}"),
                )
            }
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "Bad request", msg.clone()),
            AppError::Internal(msg) => {
                tracing::error!(error = %msg, "Internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Server error",
                    "An internal error occurred".to_string(),
                )
            }
        };

        (status, Json(ErrorBody::new(error, &message))).into_response()
    }
}
