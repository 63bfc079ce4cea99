//! Application error types.
//!
//! Connect, authenticate, and query failures all surface as a single
//! database error carrying the driver-reported message.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;

/// Result alias used across all services.
pub type AppResult<T> = Result<T, AppError>;

/// Application error.
#[derive(Debug, Error)]
pub enum AppError {
    /// Any database failure: unreachable server, bad credentials,
    /// missing database, failed query.
    #[error("{0}")]
    Database(String),
}

/// JSON body returned for structured errors.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    /// Driver-reported error message.
    pub error: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: self.to_string(),
        };
        (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_database_error_maps_to_500_json() {
        let response =
            AppError::Database("Access denied for user 'root'@'localhost'".to_string())
                .into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(
            body["error"],
            "Access denied for user 'root'@'localhost'"
        );
    }

    #[test]
    fn test_error_display_is_raw_message() {
        let err = AppError::Database("connection refused".to_string());
        assert_eq!(err.to_string(), "connection refused");
    }
}
