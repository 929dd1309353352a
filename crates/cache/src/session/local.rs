//! In-process sessions

use super::{Session, SessionProvider, SessionValue};
use crate::backend::CacheValue;
use crate::config::ClientConfig;
use crate::core::Cache;
use crate::errors::{CacheError, Result};
use crate::local::{LocalStore, LocalStoreConfig};
use crate::schema::cache_schema;
use cachet_core::{CacheScope, CallOption, OptionSet, SessionScope};
use dashmap::DashMap;
use std::any::{Any, TypeId};
use std::sync::Arc;

type StoreKey = (String, TypeId);

/// Session whose caches live in this process
///
/// One [`LocalStore`] exists per cache name and value type, shared by every
/// handle the session creates for that pair.
pub struct LocalSession {
    config: ClientConfig,
    options: OptionSet<SessionScope>,
    stores: DashMap<StoreKey, Arc<dyn Any + Send + Sync>>,
}

impl LocalSession {
    pub fn new(config: ClientConfig, options: &[CallOption<SessionScope>]) -> Result<Self> {
        config.validate()?;
        let options = OptionSet::from_options(cache_schema(), options);
        tracing::info!(
            default_ttl_ms = config.default_ttl_ms,
            sweep_interval_ms = config.sweep_interval_ms,
            options = %options,
            "created local session"
        );

        Ok(Self {
            config,
            options,
            stores: DashMap::new(),
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Like [`Session::cache`] but for values that are never serialized
    pub fn local_cache<V: CacheValue>(
        &self,
        name: &str,
        options: &[CallOption<CacheScope>],
    ) -> Result<Cache<V>> {
        let store = self.store::<V>(name)?;
        Cache::new(name, store, options)
    }

    fn store<V: CacheValue>(&self, name: &str) -> Result<Arc<LocalStore<V>>> {
        let config = LocalStoreConfig::from(&self.config);
        let erased = self
            .stores
            .entry((name.to_string(), TypeId::of::<V>()))
            .or_insert_with(|| {
                Arc::new(LocalStore::<V>::with_config(name, config)) as Arc<dyn Any + Send + Sync>
            })
            .clone();

        erased.downcast::<LocalStore<V>>().map_err(|_| {
            CacheError::configuration(format!(
                "local store for cache '{name}' holds an unexpected value type"
            ))
        })
    }
}

impl Session for LocalSession {
    fn cache<V: SessionValue>(
        &self,
        name: &str,
        options: &[CallOption<CacheScope>],
    ) -> Result<Cache<V>> {
        self.local_cache(name, options)
    }

    fn options(&self) -> &OptionSet<SessionScope> {
        &self.options
    }
}

impl std::fmt::Debug for LocalSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalSession")
            .field("config", &self.config)
            .field("caches", &self.stores.len())
            .finish()
    }
}

/// Provider of [`LocalSession`]s sharing one configuration
#[derive(Debug, Clone, Default)]
pub struct LocalSessionProvider {
    config: ClientConfig,
}

impl LocalSessionProvider {
    pub fn new(config: ClientConfig) -> Self {
        Self { config }
    }
}

impl SessionProvider for LocalSessionProvider {
    type Session = LocalSession;

    fn create_session(&self, options: &[CallOption<SessionScope>]) -> Result<LocalSession> {
        LocalSession::new(self.config, options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handles_share_a_store() {
        let session = LocalSessionProvider::default().create_session(&[]).unwrap();
        let a: Cache<String> = session.cache("shared", &[]).unwrap();
        let b: Cache<String> = session.cache("shared", &[]).unwrap();
        let other: Cache<String> = session.cache("other", &[]).unwrap();

        a.put("k", "v".to_string(), &[]).unwrap();
        assert_eq!(b.get("k", &[]).unwrap(), Some("v".to_string()));
        assert_eq!(other.get("k", &[]).unwrap(), None);
    }

    #[test]
    fn test_value_types_get_separate_stores() {
        let session = LocalSession::new(ClientConfig::default(), &[]).unwrap();
        let strings: Cache<String> = session.cache("c", &[]).unwrap();
        let numbers: Cache<u64> = session.cache("c", &[]).unwrap();

        strings.put("k", "v".to_string(), &[]).unwrap();
        assert_eq!(numbers.get("k", &[]).unwrap(), None);
    }

    #[test]
    fn test_metrics_are_per_handle() {
        let session = LocalSession::new(ClientConfig::default(), &[]).unwrap();
        let a: Cache<String> = session.cache("shared", &[]).unwrap();
        let b: Cache<String> = session.cache("shared", &[]).unwrap();

        a.put("k", "v".to_string(), &[]).unwrap();
        b.get("k", &[]).unwrap();

        assert_eq!(a.get_metrics().unwrap().hit_count(), 0);
        assert_eq!(b.get_metrics().unwrap().hit_count(), 1);
        assert_eq!(a.get_metrics().unwrap().count(), 1);
    }

    #[test]
    fn test_configured_default_ttl() {
        let config = ClientConfig {
            default_ttl_ms: 20,
            sweep_interval_ms: 5,
        };
        let session = LocalSession::new(config, &[]).unwrap();
        let cache: Cache<String> = session.cache("ttl", &[]).unwrap();

        cache.put("k", "v".to_string(), &[]).unwrap();
        std::thread::sleep(std::time::Duration::from_millis(40));
        assert_eq!(cache.get("k", &[]).unwrap(), None);
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let config = ClientConfig {
            default_ttl_ms: 0,
            sweep_interval_ms: 50,
        };
        assert!(LocalSession::new(config, &[]).is_err());
    }
}
