//! Wire contract between a remote backend and its transport

use bytes::Bytes;
use std::fmt;

/// One primitive against a named cache on the server
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportRequest {
    Get {
        key: String,
    },
    Put {
        key: String,
        value: Bytes,
        ttl_ms: i64,
        return_old: bool,
    },
    PutIfAbsent {
        key: String,
        value: Bytes,
        ttl_ms: i64,
        return_old: bool,
    },
    Replace {
        key: String,
        value: Bytes,
        ttl_ms: i64,
        return_old: bool,
    },
    ReplaceValue {
        key: String,
        old: Bytes,
        new: Bytes,
        ttl_ms: i64,
    },
    Remove {
        key: String,
        return_old: bool,
    },
    RemoveValue {
        key: String,
        value: Bytes,
    },
    Clear,
    Metrics,
}

impl TransportRequest {
    /// Primitive name used in errors and logs
    pub fn operation(&self) -> &'static str {
        match self {
            Self::Get { .. } => "get",
            Self::Put { .. } => "put",
            Self::PutIfAbsent { .. } => "putIfAbsent",
            Self::Replace { .. } => "replace",
            Self::ReplaceValue { .. } => "replaceValue",
            Self::Remove { .. } => "remove",
            Self::RemoveValue { .. } => "removeValue",
            Self::Clear => "clear",
            Self::Metrics => "metrics",
        }
    }

    pub fn key(&self) -> Option<&str> {
        match self {
            Self::Get { key }
            | Self::Put { key, .. }
            | Self::PutIfAbsent { key, .. }
            | Self::Replace { key, .. }
            | Self::ReplaceValue { key, .. }
            | Self::Remove { key, .. }
            | Self::RemoveValue { key, .. } => Some(key),
            Self::Clear | Self::Metrics => None,
        }
    }
}

/// Response status reported by a transport
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResponseStatus {
    Ok,
    NoContent,
    NotFound,
    Conflict,
    Forbidden,
    Other(u16),
}

impl ResponseStatus {
    pub fn from_code(code: u16) -> Self {
        match code {
            200 => Self::Ok,
            204 => Self::NoContent,
            403 => Self::Forbidden,
            404 => Self::NotFound,
            409 => Self::Conflict,
            other => Self::Other(other),
        }
    }

    pub fn code(&self) -> u16 {
        match self {
            Self::Ok => 200,
            Self::NoContent => 204,
            Self::Forbidden => 403,
            Self::NotFound => 404,
            Self::Conflict => 409,
            Self::Other(code) => *code,
        }
    }
}

impl fmt::Display for ResponseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            Self::Ok => "OK",
            Self::NoContent => "No Content",
            Self::NotFound => "Not Found",
            Self::Conflict => "Conflict",
            Self::Forbidden => "Forbidden",
            Self::Other(_) => "Unexpected",
        };
        write!(f, "{} {}", self.code(), reason)
    }
}

/// Status plus payload; an empty body carries no value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    pub status: ResponseStatus,
    pub body: Bytes,
}

impl TransportResponse {
    pub fn new(status: ResponseStatus, body: Bytes) -> Self {
        Self { status, body }
    }

    pub fn ok(body: Bytes) -> Self {
        Self::new(ResponseStatus::Ok, body)
    }

    pub fn no_content() -> Self {
        Self::with_status(ResponseStatus::NoContent)
    }

    pub fn with_status(status: ResponseStatus) -> Self {
        Self::new(status, Bytes::new())
    }
}

/// Failure to complete an exchange at all
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("connection failed: {0}")]
    Connection(String),

    #[error("request timed out")]
    Timeout,

    #[error(transparent)]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}

/// Carries requests to a cache server
///
/// Implementations own connection handling, retries and timeouts.
pub trait Transport: Send + Sync {
    fn execute(
        &self,
        cache: &str,
        request: TransportRequest,
    ) -> Result<TransportResponse, TransportError>;
}

impl<T: Transport + ?Sized> Transport for std::sync::Arc<T> {
    fn execute(
        &self,
        cache: &str,
        request: TransportRequest,
    ) -> Result<TransportResponse, TransportError> {
        (**self).execute(cache, request)
    }
}
