//! Remove operations

use crate::backend::CacheValue;
use crate::errors::Result;
use crate::metrics::TimedOperation;
use crate::core::types::Cache;
use cachet_core::{CallOption, Remove};

impl<V: CacheValue> Cache<V> {
    /// Remove `key`; returns the removed value if requested
    pub fn remove(&self, key: &str, options: &[CallOption<Remove>]) -> Result<Option<V>> {
        let call = self.call_options(options);
        let return_old = Self::return_old(&call);

        Self::timed(&self.recorder(), TimedOperation::Remove, || {
            self.inner.backend.remove(key, return_old)
        })
    }

    /// Remove `key` only if its current value equals `value`
    pub fn remove_value(&self, key: &str, value: &V) -> Result<bool> {
        Self::timed(&self.recorder(), TimedOperation::Remove, || {
            self.inner.backend.remove_value(key, value)
        })
    }
}
