//! Remote backend adapter
//!
//! [`RemoteBackend`] maps each primitive onto a [`TransportRequest`] and
//! evaluates the response status against the statuses that are valid for
//! that primitive. A forbidden status becomes [`CacheError::AccessDenied`];
//! anything else outside the table becomes [`CacheError::UnexpectedResponse`].

mod memory;
mod transport;

pub use memory::MemoryTransport;
pub use transport::{
    ResponseStatus, Transport, TransportError, TransportRequest, TransportResponse,
};

use crate::backend::{Backend, CacheValue, ServerMetrics};
use crate::errors::{CacheError, Result, SerializationOp};
use crate::serialization::Serializer;
use bytes::Bytes;
use cachet_core::Expiry;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

/// Backend that forwards every primitive to a cache server
pub struct RemoteBackend<V> {
    cache: String,
    transport: Arc<dyn Transport>,
    serializer: Arc<dyn Serializer>,
    _value: PhantomData<fn() -> V>,
}

impl<V> RemoteBackend<V>
where
    V: CacheValue + Serialize + DeserializeOwned,
{
    pub fn new(
        cache: impl Into<String>,
        transport: Arc<dyn Transport>,
        serializer: Arc<dyn Serializer>,
    ) -> Self {
        Self {
            cache: cache.into(),
            transport,
            serializer,
            _value: PhantomData,
        }
    }

    pub fn cache_name(&self) -> &str {
        &self.cache
    }

    fn encode(&self, key: &str, value: &V) -> Result<Bytes> {
        let model = serde_json::to_value(value).map_err(|e| CacheError::Serialization {
            key: key.to_string(),
            operation: SerializationOp::Serialize,
            source: Box::new(e),
        })?;
        self.serializer
            .serialize(&model)
            .map_err(|e| e.for_key(key))
    }

    fn decode(&self, key: &str, body: &[u8]) -> Result<Option<V>> {
        let model = self
            .serializer
            .deserialize(body)
            .map_err(|e| e.for_key(key))?;

        model
            .map(|model| {
                serde_json::from_value(model).map_err(|e| CacheError::Serialization {
                    key: key.to_string(),
                    operation: SerializationOp::Deserialize,
                    source: Box::new(e),
                })
            })
            .transpose()
    }

    fn decode_if(&self, wanted: bool, key: &str, body: &[u8]) -> Result<Option<V>> {
        if wanted {
            self.decode(key, body)
        } else {
            Ok(None)
        }
    }

    /// Send `request`; transport failures and forbidden responses become errors
    fn send(&self, request: TransportRequest) -> Result<(&'static str, TransportResponse)> {
        let operation = request.operation();
        let response = self
            .transport
            .execute(&self.cache, request)
            .map_err(|e| CacheError::Backend {
                cache: self.cache.clone(),
                operation,
                source: Box::new(e),
            })?;

        if response.status == ResponseStatus::Forbidden {
            tracing::warn!(cache = %self.cache, operation, "server denied access");
            return Err(CacheError::AccessDenied {
                cache: self.cache.clone(),
                operation,
            });
        }

        Ok((operation, response))
    }

    fn unexpected(&self, operation: &'static str, status: ResponseStatus) -> CacheError {
        tracing::warn!(cache = %self.cache, operation, %status, "unexpected response status");
        CacheError::UnexpectedResponse {
            cache: self.cache.clone(),
            operation,
            status,
        }
    }
}

impl<V> Backend<V> for RemoteBackend<V>
where
    V: CacheValue + Serialize + DeserializeOwned,
{
    fn get(&self, key: &str) -> Result<Option<V>> {
        let (operation, response) = self.send(TransportRequest::Get {
            key: key.to_string(),
        })?;

        match response.status {
            ResponseStatus::Ok => self.decode(key, &response.body),
            ResponseStatus::NotFound => Ok(None),
            status => Err(self.unexpected(operation, status)),
        }
    }

    fn put(&self, key: &str, value: V, expiry: Expiry, return_old: bool) -> Result<Option<V>> {
        let (operation, response) = self.send(TransportRequest::Put {
            key: key.to_string(),
            value: self.encode(key, &value)?,
            ttl_ms: expiry.millis(),
            return_old,
        })?;

        match response.status {
            ResponseStatus::Ok => self.decode_if(return_old, key, &response.body),
            ResponseStatus::NoContent => Ok(None),
            status => Err(self.unexpected(operation, status)),
        }
    }

    fn put_if_absent(
        &self,
        key: &str,
        value: V,
        expiry: Expiry,
        return_old: bool,
    ) -> Result<Option<V>> {
        let (operation, response) = self.send(TransportRequest::PutIfAbsent {
            key: key.to_string(),
            value: self.encode(key, &value)?,
            ttl_ms: expiry.millis(),
            return_old,
        })?;

        match response.status {
            ResponseStatus::Conflict => self.decode_if(return_old, key, &response.body),
            ResponseStatus::NoContent => Ok(None),
            status => Err(self.unexpected(operation, status)),
        }
    }

    fn replace(
        &self,
        key: &str,
        value: V,
        expiry: Expiry,
        return_old: bool,
    ) -> Result<Option<V>> {
        let (operation, response) = self.send(TransportRequest::Replace {
            key: key.to_string(),
            value: self.encode(key, &value)?,
            ttl_ms: expiry.millis(),
            return_old,
        })?;

        match response.status {
            ResponseStatus::Ok => self.decode_if(return_old, key, &response.body),
            ResponseStatus::NoContent => Ok(None),
            status => Err(self.unexpected(operation, status)),
        }
    }

    fn replace_value(&self, key: &str, old: &V, new: V, expiry: Expiry) -> Result<bool> {
        let (operation, response) = self.send(TransportRequest::ReplaceValue {
            key: key.to_string(),
            old: self.encode(key, old)?,
            new: self.encode(key, &new)?,
            ttl_ms: expiry.millis(),
        })?;

        match response.status {
            ResponseStatus::NoContent => Ok(true),
            ResponseStatus::Conflict => Ok(false),
            status => Err(self.unexpected(operation, status)),
        }
    }

    fn remove(&self, key: &str, return_old: bool) -> Result<Option<V>> {
        let (operation, response) = self.send(TransportRequest::Remove {
            key: key.to_string(),
            return_old,
        })?;

        match response.status {
            ResponseStatus::Ok => self.decode_if(return_old, key, &response.body),
            ResponseStatus::NoContent => Ok(None),
            status => Err(self.unexpected(operation, status)),
        }
    }

    fn remove_value(&self, key: &str, value: &V) -> Result<bool> {
        let (operation, response) = self.send(TransportRequest::RemoveValue {
            key: key.to_string(),
            value: self.encode(key, value)?,
        })?;

        match response.status {
            ResponseStatus::NoContent => Ok(true),
            ResponseStatus::Conflict => Ok(false),
            status => Err(self.unexpected(operation, status)),
        }
    }

    fn clear(&self) -> Result<()> {
        let (operation, response) = self.send(TransportRequest::Clear)?;
        match response.status {
            ResponseStatus::NoContent => Ok(()),
            status => Err(self.unexpected(operation, status)),
        }
    }

    fn server_metrics(&self) -> Result<ServerMetrics> {
        let (operation, response) = self.send(TransportRequest::Metrics)?;
        match response.status {
            ResponseStatus::Ok => serde_json::from_slice(&response.body)
                .map_err(|e| CacheError::from(e).for_key(operation)),
            status => Err(self.unexpected(operation, status)),
        }
    }
}

impl<V> fmt::Debug for RemoteBackend<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteBackend")
            .field("cache", &self.cache)
            .field("serializer", &self.serializer.name())
            .finish()
    }
}
