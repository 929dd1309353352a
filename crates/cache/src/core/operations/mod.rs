//! Cache operations
//!
//! Operations are implemented directly on [`Cache`] across these modules.

mod get;
mod misc;
mod put;
mod remove;

use crate::backend::CacheValue;
use crate::errors::Result;
use crate::metrics::{MetricsRecorder, TimedOperation};
use cachet_core::time::elapsed_nanos;
use cachet_core::{resolve, CacheScope, CallOption, Category, Expiry, OptionSet, Return};
use std::sync::Arc;
use std::time::Instant;

use super::types::Cache;

impl<V: CacheValue> Cache<V> {
    /// Classify per-call options with this handle's schema
    pub(super) fn call_options<C: Category>(&self, options: &[CallOption<C>]) -> OptionSet<C> {
        OptionSet::from_options(Arc::clone(self.inner.options.schema()), options)
    }

    /// The live recorder; a reset may replace it after this returns
    pub(super) fn recorder(&self) -> Arc<MetricsRecorder> {
        Arc::clone(&self.inner.metrics.read())
    }

    /// Call option, then handle option, then the expiry default
    pub(super) fn resolve_expiry<C: Category>(&self, call: &OptionSet<C>) -> Expiry {
        resolve::<Expiry, C, CacheScope>(call, &self.inner.options)
            .unwrap_or_else(Expiry::default_expiry)
    }

    pub(super) fn return_old<C: Category>(call: &OptionSet<C>) -> bool {
        call.get::<Return>().is_some_and(|r| r.value())
    }

    /// Run `f` and record its duration against `operation`, success or not
    pub(super) fn timed<T>(
        recorder: &MetricsRecorder,
        operation: TimedOperation,
        f: impl FnOnce() -> Result<T>,
    ) -> Result<T> {
        let start = Instant::now();
        let result = f();
        recorder.record(operation, elapsed_nanos(start));
        result
    }
}
