//! Storage error types.

use thiserror::Error;

/// Storage operation errors.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Object absent at query time, or of the wrong kind (a folder where a
    /// file was asked for).
    #[error("not found: {path}")]
    NotFound {
        /// Native path (relative to the root) that was not found.
        path: String,
    },

    /// Identifier is not codec output or escapes the configured root.
    #[error("malformed identifier: {0}")]
    MalformedIdentifier(String),

    /// The backend cannot resolve or create its root.
    #[error("storage root unavailable: {0}")]
    RootUnavailable(String),

    /// The backend cannot be constructed or cannot reach its storage target.
    #[error("storage backend unavailable: {0}")]
    BackendUnavailable(String),

    /// Transient read/write failure.
    #[error("storage i/o failed: {0}")]
    Io(String),
}

impl StorageError {
    /// Create a not found error.
    #[must_use]
    pub fn not_found(path: impl Into<String>) -> Self {
        Self::NotFound { path: path.into() }
    }

    /// Create a malformed identifier error.
    #[must_use]
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedIdentifier(msg.into())
    }

    /// Create a root unavailable error.
    #[must_use]
    pub fn root_unavailable(msg: impl Into<String>) -> Self {
        Self::RootUnavailable(msg.into())
    }

    /// Create a backend unavailable error.
    #[must_use]
    pub fn backend_unavailable(msg: impl Into<String>) -> Self {
        Self::BackendUnavailable(msg.into())
    }

    /// Create an i/o error.
    #[must_use]
    pub fn io(msg: impl Into<String>) -> Self {
        Self::Io(msg.into())
    }

    /// Returns true for conditions a client can trigger with a bad request.
    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        matches!(self, Self::NotFound { .. } | Self::MalformedIdentifier(_))
    }

    /// Attach a path to a raw i/o error.
    pub(crate) fn from_io(err: &std::io::Error, path: &str) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => Self::not_found(path),
            _ => Self::io(format!("{path}: {err}")),
        }
    }

    /// Attach a key to a raw OpenDAL error.
    pub(crate) fn from_opendal(err: &opendal::Error, key: &str) -> Self {
        match err.kind() {
            opendal::ErrorKind::NotFound => Self::not_found(key),
            _ => Self::io(format!("{key}: {err}")),
        }
    }
}

impl From<std::io::Error> for StorageError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => Self::NotFound {
                path: err.to_string(),
            },
            _ => Self::Io(err.to_string()),
        }
    }
}

impl From<opendal::Error> for StorageError {
    fn from(err: opendal::Error) -> Self {
        match err.kind() {
            opendal::ErrorKind::NotFound => Self::NotFound {
                path: err.to_string(),
            },
            _ => Self::Io(err.to_string()),
        }
    }
}
