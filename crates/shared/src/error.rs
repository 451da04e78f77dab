//! Application-wide error types.

use docgate_core::storage::StorageError;
use thiserror::Error;

use crate::access_token::AccessTokenError;

/// Result type alias using `AppError`.
pub type AppResult<T> = Result<T, AppError>;

/// Application error types.
#[derive(Debug, Error)]
pub enum AppError {
    /// Authentication failed.
    #[error("Authentication failed: {0}")]
    Unauthorized(String),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Malformed request.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Storage backend cannot be reached.
    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    /// Storage I/O error.
    #[error("Storage error: {0}")]
    Storage(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::Unauthorized(_) => 401,
            Self::NotFound(_) => 404,
            Self::BadRequest(_) => 400,
            Self::ServiceUnavailable(_) => 503,
            Self::Storage(_) | Self::Internal(_) => 500,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::Unauthorized(_) => "UNAUTHORIZED",
            Self::NotFound(_) => "NOT_FOUND",
            Self::BadRequest(_) => "BAD_REQUEST",
            Self::ServiceUnavailable(_) => "SERVICE_UNAVAILABLE",
            Self::Storage(_) => "STORAGE_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound { path } => Self::NotFound(path),
            StorageError::MalformedIdentifier(msg) => Self::BadRequest(msg),
            StorageError::BackendUnavailable(msg) => Self::ServiceUnavailable(msg),
            StorageError::RootUnavailable(msg) => Self::Internal(msg),
            StorageError::Io(msg) => Self::Storage(msg),
        }
    }
}

impl From<AccessTokenError> for AppError {
    fn from(err: AccessTokenError) -> Self {
        match err {
            AccessTokenError::Encoding(msg) => Self::Internal(msg),
            AccessTokenError::Expired | AccessTokenError::Invalid(_) => {
                Self::Unauthorized(err.to_string())
            }
        }
    }
}
