//! In-process backend
//!
//! Entries live in a sharded [`DashMap`]. Expired entries are hidden on read
//! and treated as absent by every conditional write; they are physically
//! removed by a sweep that runs at most once per sweep interval, at the
//! start of any primitive.

mod entry;
mod sweep;

use crate::backend::{Backend, CacheValue, ServerMetrics};
use crate::config::ClientConfig;
use crate::errors::Result;
use cachet_core::time::now_millis;
use cachet_core::Expiry;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use entry::StoredEntry;
use std::fmt;
use std::time::Duration;
use sweep::Sweeper;

/// Tunables for a [`LocalStore`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocalStoreConfig {
    /// Expiry applied when a write asks for the default
    pub default_ttl: Expiry,
    /// Minimum time between two sweeps
    pub sweep_interval: Duration,
}

impl Default for LocalStoreConfig {
    fn default() -> Self {
        Self {
            default_ttl: Expiry::never(),
            sweep_interval: Duration::from_millis(50),
        }
    }
}

impl From<&ClientConfig> for LocalStoreConfig {
    fn from(config: &ClientConfig) -> Self {
        Self {
            default_ttl: Expiry::from_millis(config.default_ttl_ms),
            sweep_interval: Duration::from_millis(config.sweep_interval_ms),
        }
    }
}

/// Thread-safe in-memory store for one named cache
pub struct LocalStore<V> {
    name: String,
    entries: DashMap<String, StoredEntry<V>>,
    sweeper: Sweeper,
    config: LocalStoreConfig,
}

impl<V: CacheValue> LocalStore<V> {
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_config(name, LocalStoreConfig::default())
    }

    pub fn with_config(name: impl Into<String>, config: LocalStoreConfig) -> Self {
        let name = name.into();
        tracing::debug!(
            cache = %name,
            default_ttl = %config.default_ttl,
            sweep_interval_ms = config.sweep_interval.as_millis() as u64,
            "creating local store"
        );

        Self {
            name,
            entries: DashMap::new(),
            sweeper: Sweeper::new(config.sweep_interval),
            config,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &LocalStoreConfig {
        &self.config
    }

    /// Physical entry count, including expired entries not yet swept
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of sweeps that have actually scanned the store
    pub fn sweep_count(&self) -> u64 {
        self.sweeper.sweeps()
    }

    /// Number of entries removed by sweeps
    pub fn swept_entries(&self) -> u64 {
        self.sweeper.swept_entries()
    }

    fn entry_for(&self, value: V, expiry: Expiry, now: i64) -> StoredEntry<V> {
        let effective = if expiry.is_default() {
            self.config.default_ttl
        } else {
            expiry
        };
        StoredEntry::new(value, effective, now)
    }

    fn begin(&self) -> i64 {
        self.sweeper.maybe_sweep(&self.entries);
        now_millis()
    }
}

impl<V: CacheValue> Backend<V> for LocalStore<V> {
    fn get(&self, key: &str) -> Result<Option<V>> {
        let now = self.begin();
        Ok(self
            .entries
            .get(key)
            .filter(|entry| !entry.is_expired(now))
            .map(|entry| entry.value.clone()))
    }

    fn put(&self, key: &str, value: V, expiry: Expiry, return_old: bool) -> Result<Option<V>> {
        let now = self.begin();
        let previous = self
            .entries
            .insert(key.to_owned(), self.entry_for(value, expiry, now));

        Ok(previous
            .filter(|old| return_old && !old.is_expired(now))
            .map(|old| old.value))
    }

    fn put_if_absent(
        &self,
        key: &str,
        value: V,
        expiry: Expiry,
        return_old: bool,
    ) -> Result<Option<V>> {
        let now = self.begin();
        match self.entries.entry(key.to_owned()) {
            Entry::Occupied(mut occupied) => {
                if occupied.get().is_expired(now) {
                    occupied.insert(self.entry_for(value, expiry, now));
                    Ok(None)
                } else if return_old {
                    Ok(Some(occupied.get().value.clone()))
                } else {
                    Ok(None)
                }
            }
            Entry::Vacant(vacant) => {
                vacant.insert(self.entry_for(value, expiry, now));
                Ok(None)
            }
        }
    }

    fn replace(
        &self,
        key: &str,
        value: V,
        expiry: Expiry,
        return_old: bool,
    ) -> Result<Option<V>> {
        let now = self.begin();
        match self.entries.entry(key.to_owned()) {
            Entry::Occupied(mut occupied) if !occupied.get().is_expired(now) => {
                let old = occupied.insert(self.entry_for(value, expiry, now));
                Ok(return_old.then_some(old.value))
            }
            _ => Ok(None),
        }
    }

    fn replace_value(&self, key: &str, old: &V, new: V, expiry: Expiry) -> Result<bool> {
        let now = self.begin();
        match self.entries.entry(key.to_owned()) {
            Entry::Occupied(mut occupied)
                if !occupied.get().is_expired(now) && occupied.get().value == *old =>
            {
                occupied.insert(self.entry_for(new, expiry, now));
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    fn remove(&self, key: &str, return_old: bool) -> Result<Option<V>> {
        let now = self.begin();
        Ok(self
            .entries
            .remove(key)
            .filter(|(_, old)| return_old && !old.is_expired(now))
            .map(|(_, old)| old.value))
    }

    fn remove_value(&self, key: &str, value: &V) -> Result<bool> {
        let now = self.begin();
        Ok(self
            .entries
            .remove_if(key, |_, entry| !entry.is_expired(now) && entry.value == *value)
            .is_some())
    }

    fn clear(&self) -> Result<()> {
        self.sweeper.exclusive(|| self.entries.clear());
        tracing::debug!(cache = %self.name, "cleared local store");
        Ok(())
    }

    fn server_metrics(&self) -> Result<ServerMetrics> {
        self.begin();
        Ok(ServerMetrics::new(
            self.entries.len() as i64,
            ServerMetrics::UNKNOWN_SIZE,
        ))
    }
}

impl<V> fmt::Debug for LocalStore<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalStore")
            .field("name", &self.name)
            .field("entries", &self.entries.len())
            .field("config", &self.config)
            .finish()
    }
}
