//! Error conversion utilities

use super::types::{CacheError, SerializationOp};

/// Convert serde_json errors to cache errors
impl From<serde_json::Error> for CacheError {
    fn from(error: serde_json::Error) -> Self {
        let operation = if error.is_io() {
            SerializationOp::Serialize
        } else {
            SerializationOp::Deserialize
        };

        Self::Serialization {
            key: String::new(),
            operation,
            source: Box::new(error),
        }
    }
}

impl CacheError {
    /// Attach `key` to a serialization error raised without one
    pub(crate) fn for_key(self, key: &str) -> Self {
        match self {
            Self::Serialization {
                key: existing,
                operation,
                source,
            } if existing.is_empty() => Self::Serialization {
                key: key.to_string(),
                operation,
                source,
            },
            other => other,
        }
    }
}
