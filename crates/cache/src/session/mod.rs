//! Sessions and session providers
//!
//! A session hands out [`Cache`] handles by name. Local sessions keep data
//! in process; remote sessions forward every primitive over a
//! [`crate::remote::Transport`].

mod local;
mod remote;

pub use local::{LocalSession, LocalSessionProvider};
pub use remote::{RemoteSession, RemoteSessionProvider};

use crate::backend::CacheValue;
use crate::core::Cache;
use crate::errors::Result;
use cachet_core::{CacheScope, CallOption, OptionSet, SessionScope};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Values that can be cached through any session
pub trait SessionValue: CacheValue + Serialize + DeserializeOwned {}

impl<T> SessionValue for T where T: CacheValue + Serialize + DeserializeOwned {}

/// Source of cache handles
pub trait Session: Send + Sync {
    /// A handle for the cache called `name`
    ///
    /// Handles for the same name share data; options apply to this handle
    /// only.
    fn cache<V: SessionValue>(
        &self,
        name: &str,
        options: &[CallOption<CacheScope>],
    ) -> Result<Cache<V>>;

    /// Options the session was created with
    fn options(&self) -> &OptionSet<SessionScope>;
}

/// Creates sessions
pub trait SessionProvider {
    type Session: Session;

    fn create_session(&self, options: &[CallOption<SessionScope>]) -> Result<Self::Session>;
}
