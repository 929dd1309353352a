//! Value serialization for remote backends
//!
//! Values cross the transport as opaque bytes. A [`Serializer`] works on
//! `serde_json::Value` so it stays object safe; typed values are converted
//! to and from that model by the remote adapter.

use crate::errors::{Result, SerializationOp};
use bytes::Bytes;
use cachet_core::{CacheScope, SessionScope};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// Encodes values to bytes and back
pub trait Serializer: fmt::Debug + Send + Sync {
    /// Short name for logs
    fn name(&self) -> &'static str;

    fn serialize(&self, value: &Value) -> Result<Bytes>;

    /// Decode a payload; an empty payload is an absent value
    fn deserialize(&self, bytes: &[u8]) -> Result<Option<Value>>;
}

/// JSON via `serde_json`
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonSerializer;

impl Serializer for JsonSerializer {
    fn name(&self) -> &'static str {
        "json"
    }

    fn serialize(&self, value: &Value) -> Result<Bytes> {
        let encoded = serde_json::to_vec(value).map_err(|e| crate::errors::Error::Serialization {
            key: String::new(),
            operation: SerializationOp::Serialize,
            source: Box::new(e),
        })?;
        Ok(Bytes::from(encoded))
    }

    fn deserialize(&self, bytes: &[u8]) -> Result<Option<Value>> {
        if bytes.is_empty() {
            return Ok(None);
        }
        Ok(Some(serde_json::from_slice(bytes)?))
    }
}

/// Option selecting the serializer of a session or a single cache
#[derive(Debug, Clone)]
pub struct SerializerOption(Arc<dyn Serializer>);

impl SerializerOption {
    pub fn new(serializer: impl Serializer + 'static) -> Self {
        Self(Arc::new(serializer))
    }

    pub fn json() -> Self {
        Self::new(JsonSerializer)
    }

    pub fn serializer(&self) -> Arc<dyn Serializer> {
        Arc::clone(&self.0)
    }
}

cachet_core::applies_to!(SerializerOption => SessionScope, CacheScope);

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_json_serializer() {
        let serializer = JsonSerializer;
        let bytes = serializer.serialize(&json!({"title": "Dune"})).unwrap();
        assert_eq!(&bytes[..], br#"{"title":"Dune"}"#);
        assert_eq!(
            serializer.deserialize(&bytes).unwrap(),
            Some(json!({"title": "Dune"}))
        );
    }

    #[test]
    fn test_empty_payload_is_absent() {
        assert_eq!(JsonSerializer.deserialize(b"").unwrap(), None);
    }

    #[test]
    fn test_garbage_is_a_deserialize_error() {
        let err = JsonSerializer.deserialize(b"{oops").unwrap_err();
        assert!(matches!(
            err,
            crate::errors::Error::Serialization {
                operation: SerializationOp::Deserialize,
                ..
            }
        ));
    }
}
