//! Core error types for the cache client

use crate::remote::ResponseStatus;

/// Result type for cache operations
pub type Result<T> = std::result::Result<T, CacheError>;

/// Re-export CacheError as Error
pub use CacheError as Error;

/// Error type for cache operations
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// The backend could not complete a primitive (I/O, connection loss, ...)
    #[error("backend failure during {operation} on cache '{cache}': {source}")]
    Backend {
        cache: String,
        operation: &'static str,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// A value could not be encoded or decoded
    #[error("failed to {operation} value for key '{key}': {source}")]
    Serialization {
        key: String,
        operation: SerializationOp,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The remote side refused the request
    #[error("access denied during {operation} on cache '{cache}'")]
    AccessDenied {
        cache: String,
        operation: &'static str,
    },

    /// The remote side answered with a status that is not valid for the primitive
    #[error("unexpected response {status} during {operation} on cache '{cache}'")]
    UnexpectedResponse {
        cache: String,
        operation: &'static str,
        status: ResponseStatus,
    },

    /// A loader option was registered for a different value type
    #[error("cache loader for cache '{cache}' does not produce values of type {expected}")]
    LoaderTypeMismatch {
        cache: String,
        expected: &'static str,
    },

    /// A local file could not be read
    #[error("I/O error during {operation} on '{path}': {source}")]
    Io {
        path: std::path::PathBuf,
        operation: &'static str,
        #[source]
        source: std::io::Error,
    },

    /// Invalid client configuration
    #[error("configuration error: {message}")]
    Configuration { message: String },
}

/// Direction of a failed serialization
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SerializationOp {
    Serialize,
    Deserialize,
}

impl std::fmt::Display for SerializationOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Serialize => f.write_str("serialize"),
            Self::Deserialize => f.write_str("deserialize"),
        }
    }
}

impl CacheError {
    /// Whether the remote side rejected the caller's credentials
    #[must_use]
    pub const fn is_access_denied(&self) -> bool {
        matches!(self, Self::AccessDenied { .. })
    }

    /// Whether the remote side broke the response contract of a primitive
    #[must_use]
    pub const fn is_protocol_violation(&self) -> bool {
        matches!(self, Self::UnexpectedResponse { .. })
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }
}
