//! Per-handle operation metrics
//!
//! A [`MetricsRecorder`] holds hit and miss counters plus one [`Timer`] per
//! timed operation. Gauges are not recorded here; they are read from the
//! backend when a snapshot is taken.

mod snapshot;
mod timer;

pub use snapshot::{MetricsSnapshot, TimerSnapshot};
pub use timer::Timer;

use crate::backend::ServerMetrics;
use std::sync::atomic::{AtomicU64, Ordering};

/// Operations with their own timer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimedOperation {
    Get,
    Put,
    Remove,
    Load,
}

/// Live counters and timers for one cache handle
#[derive(Debug, Default)]
pub struct MetricsRecorder {
    hits: AtomicU64,
    misses: AtomicU64,
    get: Timer,
    put: Timer,
    remove: Timer,
    load: Timer,
}

impl MetricsRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    /// Record one invocation of `operation` that took `nanos`
    pub fn record(&self, operation: TimedOperation, nanos: u64) {
        self.timer(operation).record(nanos);
    }

    pub fn timer(&self, operation: TimedOperation) -> &Timer {
        match operation {
            TimedOperation::Get => &self.get,
            TimedOperation::Put => &self.put,
            TimedOperation::Remove => &self.remove,
            TimedOperation::Load => &self.load,
        }
    }

    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }

    /// Copy the current state together with `gauges`
    pub fn snapshot(&self, cache_name: &str, gauges: ServerMetrics) -> MetricsSnapshot {
        MetricsSnapshot::new(
            cache_name.to_string(),
            [
                self.get.snapshot(),
                self.put.snapshot(),
                self.remove.snapshot(),
                self.load.snapshot(),
            ],
            self.hits(),
            self.misses(),
            gauges,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recorder_snapshot() {
        let recorder = MetricsRecorder::new();
        recorder.record_hit();
        recorder.record_hit();
        recorder.record_miss();
        recorder.record(TimedOperation::Get, 100);
        recorder.record(TimedOperation::Get, 300);
        recorder.record(TimedOperation::Load, 1_000);

        let snapshot = recorder.snapshot("orders", ServerMetrics::new(3, -1));
        assert_eq!(snapshot.cache_name(), "orders");
        assert_eq!(snapshot.hit_count(), 2);
        assert_eq!(snapshot.miss_count(), 1);
        assert_eq!(snapshot.get_metrics().count(), 2);
        assert_eq!(snapshot.get_metrics().max(), 300);
        assert_eq!(snapshot.load_metrics().count(), 1);
        assert_eq!(snapshot.put_metrics().count(), 0);
        assert_eq!(snapshot.remove_metrics().count(), 0);
        assert_eq!(snapshot.count(), 3);
    }

    #[test]
    fn test_snapshot_is_detached() {
        let recorder = MetricsRecorder::new();
        recorder.record_miss();
        let before = recorder.snapshot("c", ServerMetrics::default());

        recorder.record_miss();
        recorder.record(TimedOperation::Put, 5);

        assert_eq!(before.miss_count(), 1);
        assert_eq!(before.put_metrics().count(), 0);
        assert_eq!(recorder.misses(), 2);
    }
}
