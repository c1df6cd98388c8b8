//! Error types for mediabroker.

use thiserror::Error;

/// Common error type for mediabroker.
#[derive(Error, Debug)]
pub enum BrokerError {
    /// Database error.
    ///
    /// This is a generic database error that wraps errors from any database
    /// backend. Database errors from sqlx are automatically converted.
    #[error("database error: {0}")]
    Database(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// No user record exists for the given email.
    #[error("user not found: {0}")]
    UserNotFound(String),

    /// Upload would exceed the user's remaining storage.
    #[error("quota exceeded: {attempted} bytes attempted, {remaining} bytes remaining")]
    QuotaExceeded {
        /// Bytes still available before the upload.
        remaining: u64,
        /// Size of the rejected upload.
        attempted: u64,
    },

    /// File extension is not in the allowed media set.
    #[error("unsupported file type: .{0}")]
    UnsupportedType(String),

    /// Transfer to the remote storage server failed.
    #[error("upload failed: {0}")]
    UploadFailed(String),

    /// No ledger entry exists for the given token.
    #[error("file not found: {0}")]
    FileNotFound(String),

    /// Remote delete failed; local ledger and quota are untouched.
    #[error("deletion failed: {0}")]
    DeletionFailed(String),

    /// Plan does not permit the operation.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Origin or credential check failed.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// Unexpected internal error.
    #[error("internal error: {0}")]
    Internal(String),
}

// Conversion from sqlx errors
impl From<sqlx::Error> for BrokerError {
    fn from(e: sqlx::Error) -> Self {
        BrokerError::Database(e.to_string())
    }
}

impl From<reqwest::Error> for BrokerError {
    fn from(e: reqwest::Error) -> Self {
        BrokerError::UploadFailed(e.to_string())
    }
}

/// Result type alias for mediabroker operations.
pub type Result<T> = std::result::Result<T, BrokerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_not_found_display() {
        let err = BrokerError::UserNotFound("a@x.com".to_string());
        assert_eq!(err.to_string(), "user not found: a@x.com");
    }

    #[test]
    fn test_quota_exceeded_display() {
        let err = BrokerError::QuotaExceeded {
            remaining: 100,
            attempted: 150,
        };
        assert_eq!(
            err.to_string(),
            "quota exceeded: 150 bytes attempted, 100 bytes remaining"
        );
    }

    #[test]
    fn test_unsupported_type_display() {
        let err = BrokerError::UnsupportedType("txt".to_string());
        assert_eq!(err.to_string(), "unsupported file type: .txt");
    }

    #[test]
    fn test_forbidden_display() {
        let err = BrokerError::Forbidden("free plan".to_string());
        assert_eq!(err.to_string(), "forbidden: free plan");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: BrokerError = io_err.into();
        assert!(matches!(err, BrokerError::Io(_)));
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn test_result_alias() {
        fn sample_ok() -> Result<i32> {
            Ok(42)
        }

        fn sample_err() -> Result<i32> {
            Err(BrokerError::FileNotFound("tok".to_string()))
        }

        assert_eq!(sample_ok().unwrap(), 42);
        assert!(sample_err().is_err());
    }
}
