//! Unified error handling for reportsrv
//!
//! Client-input problems map to 400, credential failures to a fixed 401
//! payload, and upstream (database/filesystem) failures to 500 with a
//! generic body. Full detail is only ever logged server-side.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// Result type for reportsrv
pub type Result<T> = std::result::Result<T, ReportSrvError>;

#[derive(Error, Debug)]
pub enum ReportSrvError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("invalid month name: {0}")]
    InvalidMonth(String),

    #[error("no file was uploaded")]
    MissingFile,

    #[error("invalid username or password")]
    AuthFailed,

    #[error("configuration error: {0}")]
    Config(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("multipart error: {0}")]
    Multipart(#[from] axum::extract::multipart::MultipartError),

    #[error("internal error: {0}")]
    Internal(String),
}

impl IntoResponse for ReportSrvError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ReportSrvError::InvalidInput(_)
            | ReportSrvError::InvalidMonth(_)
            | ReportSrvError::MissingFile => (StatusCode::BAD_REQUEST, self.to_string()),
            // Lookup miss and password mismatch must be indistinguishable
            ReportSrvError::AuthFailed => {
                (StatusCode::UNAUTHORIZED, "invalid username or password".to_string())
            },
            ReportSrvError::Multipart(_) => (StatusCode::BAD_REQUEST, self.to_string()),
            ReportSrvError::Database(e) => {
                error!("database error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "database error".to_string())
            },
            ReportSrvError::Io(e) => {
                error!("i/o error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "internal server error".to_string())
            },
            ReportSrvError::Config(msg) | ReportSrvError::Internal(msg) => {
                error!("internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "internal server error".to_string())
            },
        };

        let body = Json(json!({
            "error": message,
            "status": status.as_u16()
        }));

        (status, body).into_response()
    }
}

/// Helper for missing-parameter errors
pub fn invalid_input(msg: &str) -> ReportSrvError {
    ReportSrvError::InvalidInput(msg.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ReportSrvError::InvalidMonth("Invierno".to_string());
        assert_eq!(format!("{}", err), "invalid month name: Invierno");

        let err = invalid_input("year and month are required");
        assert!(matches!(err, ReportSrvError::InvalidInput(_)));
    }

    #[test]
    fn test_auth_failure_payload_is_fixed() {
        // The same body regardless of which credential check failed
        let resp = ReportSrvError::AuthFailed.into_response();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }
}
