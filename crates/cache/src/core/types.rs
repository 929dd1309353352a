//! Cache handle types

use crate::backend::{Backend, CacheValue};
use crate::loader::CacheLoader;
use crate::metrics::MetricsRecorder;
use cachet_core::{CacheScope, OptionSet};
use parking_lot::RwLock;
use std::sync::Arc;

/// Handle to one named cache
///
/// Cloning is cheap and clones share backend, options and metrics.
pub struct Cache<V: CacheValue> {
    pub(super) inner: Arc<CacheInner<V>>,
}

pub(super) struct CacheInner<V: CacheValue> {
    pub name: String,
    pub backend: Arc<dyn Backend<V>>,
    /// Options supplied when the handle was created; immutable afterwards
    pub options: OptionSet<CacheScope>,
    pub loader: Option<Arc<dyn CacheLoader<V>>>,
    /// Swapped wholesale on reset so earlier snapshots stay intact
    pub metrics: RwLock<Arc<MetricsRecorder>>,
}

impl<V: CacheValue> Clone for Cache<V> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<V: CacheValue> std::fmt::Debug for Cache<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cache")
            .field("name", &self.inner.name)
            .field("options", &self.inner.options)
            .field("has_loader", &self.inner.loader.is_some())
            .finish()
    }
}
