//! Cache client for cachet
//!
//! This crate provides named cache handles on top of pluggable backends:
//! - [`Cache`]: per-call options, hit/miss accounting, loader fallback
//! - [`LocalStore`]: in-process backend with lazy, throttled expiry sweeps
//! - [`RemoteBackend`]: adapter over a [`Transport`] with strict status checks
//! - Sessions and session providers for local and remote caches
//! - Metrics with rate meters and latency distributions

pub mod backend;
pub mod config;
pub mod core;
pub mod errors;
pub mod loader;
pub mod local;
pub mod metrics;
pub mod remote;
pub mod schema;
pub mod serialization;
pub mod session;

pub use backend::{Backend, CacheValue, ServerMetrics};
pub use config::{ClientConfig, ClientConfigLoader, ClientConfiguration, ConfigSource};
pub use core::Cache;
pub use errors::{CacheError, Error, Result};
pub use loader::{CacheLoader, LoaderOption};
pub use local::{LocalStore, LocalStoreConfig};
pub use metrics::{MetricsRecorder, MetricsSnapshot, TimerSnapshot};
pub use remote::{
    MemoryTransport, RemoteBackend, ResponseStatus, Transport, TransportError, TransportRequest,
    TransportResponse,
};
pub use schema::cache_schema;
pub use serialization::{JsonSerializer, Serializer, SerializerOption};
pub use session::{
    LocalSession, LocalSessionProvider, RemoteSession, RemoteSessionProvider, Session,
    SessionProvider, SessionValue,
};

pub use cachet_core::{CallOption, Expiry, Return, TimeUnit};
