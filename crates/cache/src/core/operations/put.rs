//! Put and replace operations

use crate::backend::CacheValue;
use crate::errors::Result;
use crate::metrics::TimedOperation;
use crate::core::types::Cache;
use cachet_core::{CallOption, Put, Replace};

impl<V: CacheValue> Cache<V> {
    /// Store `value` under `key`; returns the previous value if
    /// [`Return::OldValue`](cachet_core::Return) was requested
    pub fn put(&self, key: &str, value: V, options: &[CallOption<Put>]) -> Result<Option<V>> {
        let call = self.call_options(options);
        let expiry = self.resolve_expiry(&call);
        let return_old = Self::return_old(&call);

        Self::timed(&self.recorder(), TimedOperation::Put, || {
            self.inner.backend.put(key, value, expiry, return_old)
        })
    }

    /// Store `value` only if `key` is absent
    ///
    /// When the key is present nothing is written and, if requested, the
    /// current value is returned.
    pub fn put_if_absent(
        &self,
        key: &str,
        value: V,
        options: &[CallOption<Put>],
    ) -> Result<Option<V>> {
        let call = self.call_options(options);
        let expiry = self.resolve_expiry(&call);
        let return_old = Self::return_old(&call);

        Self::timed(&self.recorder(), TimedOperation::Put, || {
            self.inner
                .backend
                .put_if_absent(key, value, expiry, return_old)
        })
    }

    /// Store `value` only if `key` is present
    pub fn replace(
        &self,
        key: &str,
        value: V,
        options: &[CallOption<Replace>],
    ) -> Result<Option<V>> {
        let call = self.call_options(options);
        let expiry = self.resolve_expiry(&call);
        let return_old = Self::return_old(&call);

        Self::timed(&self.recorder(), TimedOperation::Put, || {
            self.inner.backend.replace(key, value, expiry, return_old)
        })
    }

    /// Store `new` only if the current value equals `old`
    pub fn replace_value(
        &self,
        key: &str,
        old: &V,
        new: V,
        options: &[CallOption<Replace>],
    ) -> Result<bool> {
        let call = self.call_options(options);
        let expiry = self.resolve_expiry(&call);

        Self::timed(&self.recorder(), TimedOperation::Put, || {
            self.inner.backend.replace_value(key, old, new, expiry)
        })
    }
}
