//! Get with loader fallback

use crate::backend::CacheValue;
use crate::errors::Result;
use crate::loader::CacheLoader;
use crate::metrics::{MetricsRecorder, TimedOperation};
use crate::core::types::Cache;
use cachet_core::time::elapsed_nanos;
use cachet_core::{CallOption, Get};
use std::time::Instant;

impl<V: CacheValue> Cache<V> {
    /// Get the value for `key`
    ///
    /// On a miss with a configured loader, the loaded value is installed
    /// with an atomic insert-if-absent and whichever value wins that insert
    /// is returned. Concurrent misses may each invoke the loader.
    pub fn get(&self, key: &str, options: &[CallOption<Get>]) -> Result<Option<V>> {
        let call = self.call_options(options);
        let recorder = self.recorder();

        let found = Self::timed(&recorder, TimedOperation::Get, || {
            self.inner.backend.get(key)
        })?;

        if let Some(value) = found {
            recorder.record_hit();
            return Ok(Some(value));
        }

        recorder.record_miss();
        tracing::debug!(cache = %self.inner.name, key, "cache miss");

        match &self.inner.loader {
            Some(loader) => {
                let expiry = self.resolve_expiry(&call);
                self.load(key, loader.as_ref(), expiry, &recorder)
            }
            None => Ok(None),
        }
    }

    fn load(
        &self,
        key: &str,
        loader: &dyn CacheLoader<V>,
        expiry: cachet_core::Expiry,
        recorder: &MetricsRecorder,
    ) -> Result<Option<V>> {
        let start = Instant::now();
        let loaded = loader.load(key);
        recorder.record(TimedOperation::Load, elapsed_nanos(start));

        let Some(value) = loaded else {
            tracing::debug!(cache = %self.inner.name, key, "loader produced no value");
            return Ok(None);
        };

        // straight to the backend so a load is not also counted as a put
        match self
            .inner
            .backend
            .put_if_absent(key, value.clone(), expiry, true)?
        {
            Some(current) => {
                tracing::debug!(
                    cache = %self.inner.name,
                    key,
                    "another writer installed a value first; returning it"
                );
                Ok(Some(current))
            }
            None => {
                tracing::debug!(cache = %self.inner.name, key, "installed loaded value");
                Ok(Some(value))
            }
        }
    }
}
