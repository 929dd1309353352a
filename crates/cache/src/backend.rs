//! Pluggable storage behind a cache handle
//!
//! A [`Backend`] exposes the raw primitives that [`crate::Cache`] times,
//! records and composes. Primitives decide success on their own: a
//! `put_if_absent` against a present key is a no-op, a `replace` against an
//! absent key is a no-op, and so on.

use crate::errors::Result;
use cachet_core::Expiry;
use serde::{Deserialize, Serialize};

/// Values that can be held by a cache
pub trait CacheValue: Clone + PartialEq + Send + Sync + 'static {}

impl<T> CacheValue for T where T: Clone + PartialEq + Send + Sync + 'static {}

/// Entry count and aggregate byte size reported by a backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ServerMetrics {
    pub count: i64,
    pub size: i64,
}

impl ServerMetrics {
    /// Reported when the aggregate byte size cannot be computed
    pub const UNKNOWN_SIZE: i64 = -1;

    pub const fn new(count: i64, size: i64) -> Self {
        Self { count, size }
    }
}

/// Storage primitives for one named cache
///
/// `return_old` only changes what is handed back; implementations may skip
/// producing the previous value when it is `false`.
pub trait Backend<V: CacheValue>: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<V>>;

    fn put(&self, key: &str, value: V, expiry: Expiry, return_old: bool) -> Result<Option<V>>;

    /// Store `value` only if `key` is absent; on conflict the current value
    /// is returned when `return_old` is set
    fn put_if_absent(
        &self,
        key: &str,
        value: V,
        expiry: Expiry,
        return_old: bool,
    ) -> Result<Option<V>>;

    /// Store `value` only if `key` is present
    fn replace(&self, key: &str, value: V, expiry: Expiry, return_old: bool)
        -> Result<Option<V>>;

    /// Store `new` only if the current value equals `old`; expiry is not compared
    fn replace_value(&self, key: &str, old: &V, new: V, expiry: Expiry) -> Result<bool>;

    fn remove(&self, key: &str, return_old: bool) -> Result<Option<V>>;

    /// Remove `key` only if its current value equals `value`
    fn remove_value(&self, key: &str, value: &V) -> Result<bool>;

    fn clear(&self) -> Result<()>;

    fn server_metrics(&self) -> Result<ServerMetrics>;
}
