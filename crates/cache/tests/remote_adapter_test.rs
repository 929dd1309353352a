//! Integration tests for the remote backend over a transport

use cachet_cache::{
    Cache, CacheError, LoaderOption, MemoryTransport, RemoteSession, RemoteSessionProvider,
    ResponseStatus, Return, Session, SessionProvider, Transport, TransportError,
    TransportRequest, TransportResponse,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Book {
    title: String,
    year: u16,
}

fn dune() -> Book {
    Book {
        title: "Dune".into(),
        year: 1965,
    }
}

/// Answers every request with one fixed status
struct FixedStatus(ResponseStatus);

impl Transport for FixedStatus {
    fn execute(
        &self,
        _cache: &str,
        _request: TransportRequest,
    ) -> Result<TransportResponse, TransportError> {
        Ok(TransportResponse::with_status(self.0))
    }
}

#[test]
fn test_struct_values_round_trip() {
    let provider = RemoteSessionProvider::new(Arc::new(MemoryTransport::new()));
    let session = provider.create_session(&[]).unwrap();
    let books: Cache<Book> = session.cache("books", &[]).unwrap();

    assert_eq!(books.get("1", &[]).unwrap(), None);
    books.put("1", dune(), &[]).unwrap();
    assert_eq!(books.get("1", &[]).unwrap(), Some(dune()));

    let mut revised = dune();
    revised.year = 1966;
    assert_eq!(
        books
            .put_if_absent("1", revised.clone(), &[Return::OldValue.into()])
            .unwrap(),
        Some(dune())
    );
    assert!(books.replace_value("1", &dune(), revised.clone(), &[]).unwrap());
    assert!(!books.remove_value("1", &dune()).unwrap());
    assert!(books.remove_value("1", &revised).unwrap());
    assert_eq!(books.get_metrics().unwrap().count(), 0);
}

#[test]
fn test_remote_loader_populates_server() {
    let transport = Arc::new(MemoryTransport::new());
    let session = RemoteSession::new(Arc::clone(&transport), &[]);
    let loader = LoaderOption::from_fn(|key: &str| Some(format!("{key}-value")));
    let cache: Cache<String> = session.cache("loaded", &[loader.into()]).unwrap();

    assert_eq!(cache.get("k", &[]).unwrap(), Some("k-value".to_string()));

    // a second handle without a loader sees the populated value
    let plain: Cache<String> = session.cache("loaded", &[]).unwrap();
    assert_eq!(plain.get("k", &[]).unwrap(), Some("k-value".to_string()));
}

#[test]
fn test_forbidden_surfaces_as_access_denied() {
    let transport = Arc::new(MemoryTransport::new());
    let session = RemoteSession::new(Arc::clone(&transport), &[]);
    let cache: Cache<String> = session.cache("secure", &[]).unwrap();

    cache.put("k", "v".to_string(), &[]).unwrap();
    transport.set_deny_all(true);

    let err = cache.get("k", &[]).unwrap_err();
    assert!(err.is_access_denied());
    assert!(cache.clear().unwrap_err().is_access_denied());

    transport.set_deny_all(false);
    assert_eq!(cache.get("k", &[]).unwrap(), Some("v".to_string()));
}

#[test]
fn test_unexpected_status_is_a_protocol_violation() {
    let session = RemoteSession::new(Arc::new(FixedStatus(ResponseStatus::Other(500))), &[]);
    let cache: Cache<String> = session.cache("broken", &[]).unwrap();

    let err = cache.get("k", &[]).unwrap_err();
    assert!(err.is_protocol_violation());
    assert!(!err.is_access_denied());
}

#[test]
fn test_status_valid_elsewhere_is_still_rejected() {
    // Conflict is valid for putIfAbsent but not for get or clear
    let session = RemoteSession::new(Arc::new(FixedStatus(ResponseStatus::Conflict)), &[]);
    let cache: Cache<String> = session.cache("strict", &[]).unwrap();

    assert!(cache.get("k", &[]).unwrap_err().is_protocol_violation());
    assert!(cache.clear().unwrap_err().is_protocol_violation());
    assert_eq!(
        cache
            .put_if_absent("k", "v".to_string(), &[])
            .unwrap(),
        None
    );
}

#[test]
fn test_get_errors_are_not_counted_as_misses() {
    let session = RemoteSession::new(Arc::new(FixedStatus(ResponseStatus::Forbidden)), &[]);
    let cache: Cache<String> = session.cache("denied", &[]).unwrap();

    match cache.get("k", &[]) {
        Err(CacheError::AccessDenied { cache, operation }) => {
            assert_eq!(cache, "denied");
            assert_eq!(operation, "get");
        }
        other => panic!("expected access denied, got {other:?}"),
    }

    // metrics read the server gauges, which are denied as well
    assert!(cache.get_metrics().unwrap_err().is_access_denied());
}
