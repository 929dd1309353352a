//! Sessions backed by a transport

use super::{Session, SessionProvider, SessionValue};
use crate::core::Cache;
use crate::errors::Result;
use crate::remote::{RemoteBackend, Transport};
use crate::schema::cache_schema;
use crate::serialization::SerializerOption;
use cachet_core::{resolve, CacheScope, CallOption, OptionSet, SessionScope};
use std::sync::Arc;

/// Session whose caches live on a server reached through `T`
pub struct RemoteSession<T> {
    transport: Arc<T>,
    options: OptionSet<SessionScope>,
}

impl<T: Transport + 'static> RemoteSession<T> {
    pub fn new(transport: Arc<T>, options: &[CallOption<SessionScope>]) -> Self {
        let options = OptionSet::from_options(cache_schema(), options);
        tracing::info!(options = %options, "created remote session");
        Self { transport, options }
    }

    pub fn transport(&self) -> &Arc<T> {
        &self.transport
    }
}

impl<T: Transport + 'static> Session for RemoteSession<T> {
    /// The serializer is taken from the cache options, then the session
    /// options, then the schema default
    fn cache<V: SessionValue>(
        &self,
        name: &str,
        options: &[CallOption<CacheScope>],
    ) -> Result<Cache<V>> {
        let cache_options = OptionSet::from_options(cache_schema(), options);
        let serializer =
            resolve::<SerializerOption, CacheScope, SessionScope>(&cache_options, &self.options)
                .unwrap_or_else(SerializerOption::json)
                .serializer();

        tracing::debug!(cache = name, serializer = serializer.name(), "creating remote cache");

        let transport: Arc<dyn Transport> = self.transport.clone();
        let backend = RemoteBackend::<V>::new(name, transport, serializer);
        Cache::with_options(name, Arc::new(backend), cache_options)
    }

    fn options(&self) -> &OptionSet<SessionScope> {
        &self.options
    }
}

impl<T> std::fmt::Debug for RemoteSession<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteSession")
            .field("options", &self.options)
            .finish()
    }
}

/// Provider of [`RemoteSession`]s sharing one transport
pub struct RemoteSessionProvider<T> {
    transport: Arc<T>,
}

impl<T: Transport + 'static> RemoteSessionProvider<T> {
    pub fn new(transport: Arc<T>) -> Self {
        Self { transport }
    }
}

impl<T: Transport + 'static> SessionProvider for RemoteSessionProvider<T> {
    type Session = RemoteSession<T>;

    fn create_session(&self, options: &[CallOption<SessionScope>]) -> Result<RemoteSession<T>> {
        Ok(RemoteSession::new(Arc::clone(&self.transport), options))
    }
}
