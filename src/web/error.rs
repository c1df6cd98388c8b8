//! API error handling for the Web surface.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::collections::HashMap;

use crate::BrokerError;

/// API error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Bad request (400).
    BadRequest,
    /// Unauthorized (401).
    Unauthorized,
    /// Forbidden (403).
    Forbidden,
    /// Not found (404).
    NotFound,
    /// Quota exceeded (413).
    QuotaExceeded,
    /// Unsupported file type (422).
    UnsupportedType,
    /// Rate limited (429).
    TooManyRequests,
    /// Internal server error (500).
    InternalError,
    /// Remote storage failure (502).
    RemoteFailure,
}

impl ErrorCode {
    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ErrorCode::BadRequest => StatusCode::BAD_REQUEST,
            ErrorCode::Unauthorized => StatusCode::UNAUTHORIZED,
            ErrorCode::Forbidden => StatusCode::FORBIDDEN,
            ErrorCode::NotFound => StatusCode::NOT_FOUND,
            ErrorCode::QuotaExceeded => StatusCode::PAYLOAD_TOO_LARGE,
            ErrorCode::UnsupportedType => StatusCode::UNPROCESSABLE_ENTITY,
            ErrorCode::TooManyRequests => StatusCode::TOO_MANY_REQUESTS,
            ErrorCode::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
            ErrorCode::RemoteFailure => StatusCode::BAD_GATEWAY,
        }
    }
}

/// API error response body.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// Error details.
    pub error: ErrorDetail,
}

/// Error detail.
#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    /// Error code.
    pub code: ErrorCode,
    /// Human-readable message.
    pub message: String,
    /// Diagnostic numbers (only present where relevant, e.g. quota).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<HashMap<String, u64>>,
}

/// API error type.
#[derive(Debug)]
pub struct ApiError {
    code: ErrorCode,
    message: String,
    details: Option<HashMap<String, u64>>,
}

impl ApiError {
    /// Create a new API error.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
        }
    }

    /// Create a bad request error.
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::BadRequest, message)
    }

    /// Create an unauthorized error.
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Unauthorized, message)
    }

    /// Create a forbidden error.
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Forbidden, message)
    }

    /// Create a not found error.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::NotFound, message)
    }

    /// Create a rate-limited error.
    pub fn too_many_requests(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::TooManyRequests, message)
    }

    /// Create an internal error with a generic caller-facing message.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }

    /// Get the error code.
    pub fn code(&self) -> ErrorCode {
        self.code
    }
}

impl From<BrokerError> for ApiError {
    fn from(e: BrokerError) -> Self {
        match e {
            BrokerError::UserNotFound(_) | BrokerError::FileNotFound(_) => {
                Self::new(ErrorCode::NotFound, e.to_string())
            }
            BrokerError::QuotaExceeded {
                remaining,
                attempted,
            } => {
                let mut details = HashMap::new();
                details.insert("remaining".to_string(), remaining);
                details.insert("attempted".to_string(), attempted);
                Self {
                    code: ErrorCode::QuotaExceeded,
                    message: "storage quota exceeded".to_string(),
                    details: Some(details),
                }
            }
            BrokerError::UnsupportedType(_) => Self::new(ErrorCode::UnsupportedType, e.to_string()),
            BrokerError::UploadFailed(_) | BrokerError::DeletionFailed(_) => {
                Self::new(ErrorCode::RemoteFailure, e.to_string())
            }
            BrokerError::Forbidden(_) => Self::new(ErrorCode::Forbidden, e.to_string()),
            BrokerError::Unauthorized(_) => Self::new(ErrorCode::Unauthorized, e.to_string()),
            // Unexpected errors are logged in full, the caller gets a
            // generic message
            BrokerError::Database(_)
            | BrokerError::Io(_)
            | BrokerError::Config(_)
            | BrokerError::Internal(_) => {
                tracing::error!("internal error: {}", e);
                Self::internal("internal server error")
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.code.status_code();
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code,
                message: self.message,
                details: self.details,
            },
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            ErrorCode::QuotaExceeded.status_code(),
            StatusCode::PAYLOAD_TOO_LARGE
        );
        assert_eq!(
            ErrorCode::UnsupportedType.status_code(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            ErrorCode::TooManyRequests.status_code(),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            ErrorCode::RemoteFailure.status_code(),
            StatusCode::BAD_GATEWAY
        );
    }

    #[test]
    fn test_quota_exceeded_carries_diagnostics() {
        let api_err: ApiError = BrokerError::QuotaExceeded {
            remaining: 100,
            attempted: 150,
        }
        .into();

        assert_eq!(api_err.code(), ErrorCode::QuotaExceeded);
        let details = api_err.details.unwrap();
        assert_eq!(details["remaining"], 100);
        assert_eq!(details["attempted"], 150);
    }

    #[test]
    fn test_internal_errors_are_generic() {
        let api_err: ApiError = BrokerError::Database("secret table dropped".to_string()).into();

        assert_eq!(api_err.code(), ErrorCode::InternalError);
        assert_eq!(api_err.message, "internal server error");
    }

    #[test]
    fn test_not_found_mapping() {
        let api_err: ApiError = BrokerError::FileNotFound("tok".to_string()).into();
        assert_eq!(api_err.code(), ErrorCode::NotFound);

        let api_err: ApiError = BrokerError::UserNotFound("a@x.com".to_string()).into();
        assert_eq!(api_err.code(), ErrorCode::NotFound);
    }
}
