//! Throttled, lazy removal of expired entries

use super::entry::StoredEntry;
use cachet_core::time::now_millis;
use dashmap::DashMap;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::time::Duration;

/// Serialises sweeps and `clear` and throttles how often sweeps run
#[derive(Debug)]
pub(crate) struct Sweeper {
    next_sweep_at: AtomicI64,
    interval_ms: i64,
    lock: Mutex<()>,
    sweeps: AtomicU64,
    swept_entries: AtomicU64,
}

impl Sweeper {
    pub fn new(interval: Duration) -> Self {
        Self {
            next_sweep_at: AtomicI64::new(0),
            interval_ms: i64::try_from(interval.as_millis()).unwrap_or(i64::MAX),
            lock: Mutex::new(()),
            sweeps: AtomicU64::new(0),
            swept_entries: AtomicU64::new(0),
        }
    }

    /// Remove expired entries unless a sweep ran within the last interval
    pub fn maybe_sweep<V>(&self, entries: &DashMap<String, StoredEntry<V>>) {
        if now_millis() < self.next_sweep_at.load(Ordering::Acquire) {
            return;
        }

        let _guard = self.lock.lock();

        // another caller may have swept while we waited for the lock
        let now = now_millis();
        if now < self.next_sweep_at.load(Ordering::Acquire) {
            return;
        }

        let expired: Vec<String> = entries
            .iter()
            .filter(|item| item.value().is_expired(now))
            .map(|item| item.key().clone())
            .collect();

        let mut removed = 0u64;
        for key in &expired {
            // a fresh write may have landed since the scan
            if entries.remove_if(key, |_, entry| entry.is_expired(now)).is_some() {
                removed += 1;
            }
        }

        self.sweeps.fetch_add(1, Ordering::Relaxed);
        self.swept_entries.fetch_add(removed, Ordering::Relaxed);
        // measured after the scan; a slow scan must not leave the next one already due
        let finished = now_millis();
        self.next_sweep_at
            .store(finished.saturating_add(self.interval_ms), Ordering::Release);

        if removed > 0 {
            tracing::trace!(removed, remaining = entries.len(), "swept expired entries");
        }
    }

    /// Run `f` while holding the sweep lock
    pub fn exclusive<R>(&self, f: impl FnOnce() -> R) -> R {
        let _guard = self.lock.lock();
        f()
    }

    pub fn sweeps(&self) -> u64 {
        self.sweeps.load(Ordering::Relaxed)
    }

    pub fn swept_entries(&self) -> u64 {
        self.swept_entries.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cachet_core::Expiry;
    use std::sync::{Arc, Barrier};
    use std::time::Instant;

    fn map_with(entries: &[(&str, Option<i64>)]) -> DashMap<String, StoredEntry<u32>> {
        let map = DashMap::new();
        for (key, expires_at) in entries {
            map.insert(
                (*key).to_string(),
                StoredEntry {
                    value: 1,
                    expires_at: *expires_at,
                },
            );
        }
        map
    }

    #[test]
    fn test_sweep_removes_only_expired() {
        let now = now_millis();
        let map = map_with(&[
            ("old", Some(now - 1_000)),
            ("fresh", Some(now + 60_000)),
            ("forever", None),
        ]);

        let sweeper = Sweeper::new(Duration::from_millis(50));
        sweeper.maybe_sweep(&map);

        assert_eq!(sweeper.sweeps(), 1);
        assert_eq!(sweeper.swept_entries(), 1);
        assert!(!map.contains_key("old"));
        assert!(map.contains_key("fresh"));
        assert!(map.contains_key("forever"));
    }

    #[test]
    fn test_sweeps_are_throttled() {
        let map = map_with(&[]);
        let sweeper = Sweeper::new(Duration::from_secs(60));

        sweeper.maybe_sweep(&map);
        sweeper.maybe_sweep(&map);
        sweeper.maybe_sweep(&map);

        assert_eq!(sweeper.sweeps(), 1);
    }

    #[test]
    fn test_slow_sweep_is_not_immediately_due_again() {
        let map = Arc::new(map_with(&[("held", None)]));
        let sweeper = Sweeper::new(Duration::from_millis(50));
        let locked = Arc::new(Barrier::new(2));

        // a writer holding the shard keeps the scan blocked well past the interval
        let holder = {
            let map = map.clone();
            let locked = locked.clone();
            std::thread::spawn(move || {
                let _entry = map.get_mut("held");
                locked.wait();
                std::thread::sleep(Duration::from_millis(150));
            })
        };

        locked.wait();
        let started = Instant::now();
        sweeper.maybe_sweep(&map);
        assert!(started.elapsed() >= Duration::from_millis(100));
        holder.join().unwrap();

        sweeper.maybe_sweep(&map);
        assert_eq!(sweeper.sweeps(), 1);
    }

    #[test]
    fn test_sweep_runs_again_after_interval() {
        let map: DashMap<String, StoredEntry<u32>> = DashMap::new();
        let sweeper = Sweeper::new(Duration::from_millis(10));

        sweeper.maybe_sweep(&map);
        std::thread::sleep(Duration::from_millis(25));
        map.insert(
            "short".to_string(),
            StoredEntry::new(7, Expiry::from_millis(1), now_millis() - 10),
        );
        sweeper.maybe_sweep(&map);

        assert_eq!(sweeper.sweeps(), 2);
        assert!(map.is_empty());
    }
}
