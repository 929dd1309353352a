//! In-process transport answering like a cache server

use super::transport::{
    ResponseStatus, Transport, TransportError, TransportRequest, TransportResponse,
};
use crate::backend::Backend;
use crate::local::{LocalStore, LocalStoreConfig};
use bytes::Bytes;
use cachet_core::Expiry;
use dashmap::DashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Serves every named cache from a [`LocalStore`] of raw payloads
///
/// Payload equality stands in for value equality, so conditional writes
/// compare serialized bytes.
#[derive(Debug, Default)]
pub struct MemoryTransport {
    caches: DashMap<String, Arc<LocalStore<Bytes>>>,
    config: LocalStoreConfig,
    deny_all: AtomicBool,
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: LocalStoreConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Answer every request with a forbidden status while set
    pub fn set_deny_all(&self, deny: bool) {
        self.deny_all.store(deny, Ordering::Relaxed);
    }

    fn store(&self, cache: &str) -> Arc<LocalStore<Bytes>> {
        self.caches
            .entry(cache.to_string())
            .or_insert_with(|| Arc::new(LocalStore::with_config(cache, self.config)))
            .clone()
    }

    fn serve(
        store: &LocalStore<Bytes>,
        request: TransportRequest,
    ) -> crate::errors::Result<TransportResponse> {
        let old_or_empty = |old: Option<Bytes>| match old {
            Some(old) => TransportResponse::ok(old),
            None => TransportResponse::no_content(),
        };
        let stored_or_conflict = |done: bool| {
            if done {
                TransportResponse::no_content()
            } else {
                TransportResponse::with_status(ResponseStatus::Conflict)
            }
        };

        let response = match request {
            TransportRequest::Get { key } => match store.get(&key)? {
                Some(value) => TransportResponse::ok(value),
                None => TransportResponse::with_status(ResponseStatus::NotFound),
            },
            TransportRequest::Put {
                key,
                value,
                ttl_ms,
                return_old,
            } => old_or_empty(store.put(&key, value, Expiry::from_millis(ttl_ms), return_old)?),
            TransportRequest::PutIfAbsent {
                key,
                value,
                ttl_ms,
                return_old,
            } => match store.put_if_absent(&key, value, Expiry::from_millis(ttl_ms), true)? {
                Some(current) => TransportResponse::new(
                    ResponseStatus::Conflict,
                    if return_old { current } else { Bytes::new() },
                ),
                None => TransportResponse::no_content(),
            },
            TransportRequest::Replace {
                key,
                value,
                ttl_ms,
                return_old,
            } => old_or_empty(store.replace(&key, value, Expiry::from_millis(ttl_ms), return_old)?),
            TransportRequest::ReplaceValue {
                key,
                old,
                new,
                ttl_ms,
            } => stored_or_conflict(store.replace_value(
                &key,
                &old,
                new,
                Expiry::from_millis(ttl_ms),
            )?),
            TransportRequest::Remove { key, return_old } => {
                old_or_empty(store.remove(&key, return_old)?)
            }
            TransportRequest::RemoveValue { key, value } => {
                stored_or_conflict(store.remove_value(&key, &value)?)
            }
            TransportRequest::Clear => {
                store.clear()?;
                TransportResponse::no_content()
            }
            TransportRequest::Metrics => {
                TransportResponse::ok(Bytes::from(serde_json::to_vec(&store.server_metrics()?)?))
            }
        };

        Ok(response)
    }
}

impl Transport for MemoryTransport {
    fn execute(
        &self,
        cache: &str,
        request: TransportRequest,
    ) -> Result<TransportResponse, TransportError> {
        if self.deny_all.load(Ordering::Relaxed) {
            return Ok(TransportResponse::with_status(ResponseStatus::Forbidden));
        }

        tracing::trace!(cache, operation = request.operation(), "serving in-memory request");
        Self::serve(&self.store(cache), request).map_err(|e| TransportError::Other(Box::new(e)))
    }
}
