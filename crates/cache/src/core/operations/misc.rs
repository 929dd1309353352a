//! Clear, metrics and accessors

use crate::backend::CacheValue;
use crate::errors::Result;
use crate::metrics::{MetricsRecorder, MetricsSnapshot};
use crate::core::types::Cache;
use cachet_core::{CacheScope, OptionSet};
use std::sync::Arc;

impl<V: CacheValue> Cache<V> {
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Options this handle was created with
    pub fn options(&self) -> &OptionSet<CacheScope> {
        &self.inner.options
    }

    pub fn has_loader(&self) -> bool {
        self.inner.loader.is_some()
    }

    /// Remove every entry
    pub fn clear(&self) -> Result<()> {
        self.inner.backend.clear()?;
        tracing::debug!(cache = %self.inner.name, "cleared cache");
        Ok(())
    }

    /// Snapshot of counters and timers with live backend gauges
    pub fn get_metrics(&self) -> Result<MetricsSnapshot> {
        let gauges = self.inner.backend.server_metrics()?;
        Ok(self.recorder().snapshot(&self.inner.name, gauges))
    }

    /// Start counting from zero
    ///
    /// Installs a fresh recorder; snapshots taken earlier keep their values
    /// and backend gauges are unaffected.
    pub fn reset_metrics(&self) {
        *self.inner.metrics.write() = Arc::new(MetricsRecorder::new());
        tracing::debug!(cache = %self.inner.name, "reset metrics");
    }
}
