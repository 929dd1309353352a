//! Cache handle construction

use crate::backend::{Backend, CacheValue};
use crate::errors::{CacheError, Result};
use crate::loader::LoaderOption;
use crate::local::LocalStore;
use crate::metrics::MetricsRecorder;
use crate::schema::cache_schema;
use cachet_core::{CacheScope, CallOption, OptionSet};
use parking_lot::RwLock;
use std::sync::Arc;

use super::types::{Cache, CacheInner};

impl<V: CacheValue> Cache<V> {
    /// Create a handle over `backend` with cache-scoped `options`
    pub fn new(
        name: impl Into<String>,
        backend: Arc<dyn Backend<V>>,
        options: &[CallOption<CacheScope>],
    ) -> Result<Self> {
        Self::with_options(
            name,
            backend,
            OptionSet::from_options(cache_schema(), options),
        )
    }

    /// Create a handle from an already classified option set
    ///
    /// Fails if a [`LoaderOption`] was registered for a value type other
    /// than `V`.
    pub fn with_options(
        name: impl Into<String>,
        backend: Arc<dyn Backend<V>>,
        options: OptionSet<CacheScope>,
    ) -> Result<Self> {
        let name = name.into();

        let loader = match options.explicit::<LoaderOption>() {
            Some(option) => Some(option.loader::<V>().ok_or_else(|| {
                CacheError::LoaderTypeMismatch {
                    cache: name.clone(),
                    expected: std::any::type_name::<V>(),
                }
            })?),
            None => None,
        };

        tracing::info!(
            cache = %name,
            options = %options,
            loader = loader.is_some(),
            "created cache handle"
        );

        Ok(Self {
            inner: Arc::new(CacheInner {
                name,
                backend,
                options,
                loader,
                metrics: RwLock::new(Arc::new(MetricsRecorder::new())),
            }),
        })
    }

    /// Create a handle over a private [`LocalStore`] with default settings
    pub fn local(name: impl Into<String>, options: &[CallOption<CacheScope>]) -> Result<Self> {
        let name = name.into();
        let store: Arc<dyn Backend<V>> = Arc::new(LocalStore::<V>::new(name.clone()));
        Self::new(name, store, options)
    }
}
