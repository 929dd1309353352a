//! Loader, option precedence and metrics reset tests

use crate::backend::Backend;
use crate::core::Cache;
use crate::errors::{CacheError, Result};
use crate::loader::LoaderOption;
use crate::local::LocalStore;
use cachet_core::{CacheScope, CallOption, Expiry, TimeUnit};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

fn counting_loader(calls: Arc<AtomicUsize>) -> LoaderOption {
    LoaderOption::from_fn(move |key: &str| {
        calls.fetch_add(1, Ordering::SeqCst);
        if key == "missing" {
            None
        } else {
            Some(format!("{key}-value"))
        }
    })
}

#[test]
fn test_loader_fallback() -> Result<()> {
    let calls = Arc::new(AtomicUsize::new(0));
    let cache: Cache<String> = Cache::local("loader", &[counting_loader(calls.clone()).into()])?;
    assert!(cache.has_loader());

    assert_eq!(cache.get("k", &[])?, Some("k-value".to_string()));
    let metrics = cache.get_metrics()?;
    assert_eq!(metrics.miss_count(), 1);
    assert_eq!(metrics.load_metrics().count(), 1);

    assert_eq!(cache.get("k", &[])?, Some("k-value".to_string()));
    let metrics = cache.get_metrics()?;
    assert_eq!(metrics.hit_count(), 1);
    assert_eq!(metrics.load_metrics().count(), 1);
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    Ok(())
}

#[test]
fn test_load_is_not_counted_as_put() -> Result<()> {
    let calls = Arc::new(AtomicUsize::new(0));
    let cache: Cache<String> = Cache::local("loads", &[counting_loader(calls.clone()).into()])?;

    cache.get("a", &[])?;
    cache.get("b", &[])?;

    let metrics = cache.get_metrics()?;
    assert_eq!(metrics.load_metrics().count(), 2);
    assert_eq!(metrics.put_metrics().count(), 0);
    assert_eq!(metrics.count(), 2);

    Ok(())
}

#[test]
fn test_loader_returning_nothing_inserts_nothing() -> Result<()> {
    let calls = Arc::new(AtomicUsize::new(0));
    let cache: Cache<String> = Cache::local("loader", &[counting_loader(calls.clone()).into()])?;

    assert_eq!(cache.get("missing", &[])?, None);
    let metrics = cache.get_metrics()?;
    assert_eq!(metrics.count(), 0);
    assert_eq!(metrics.miss_count(), 1);
    assert_eq!(metrics.load_metrics().count(), 1);
    assert_eq!(metrics.put_metrics().count(), 0);

    Ok(())
}

#[test]
fn test_loader_loses_to_existing_writer() -> Result<()> {
    let store: Arc<LocalStore<String>> = Arc::new(LocalStore::new("race"));
    let racing_store = Arc::clone(&store);

    // the loader simulates another caller installing a value mid-load
    let loader = LoaderOption::from_fn(move |key: &str| {
        racing_store
            .put(key, "first".to_string(), Expiry::never(), false)
            .ok()?;
        Some("second".to_string())
    });

    let cache: Cache<String> = Cache::new("race", store, &[loader.into()])?;
    assert_eq!(cache.get("k", &[])?, Some("first".to_string()));
    assert_eq!(cache.get("k", &[])?, Some("first".to_string()));

    Ok(())
}

#[test]
fn test_loader_for_wrong_type_is_rejected() {
    let loader = LoaderOption::from_fn(|_: &str| Some(7u32));
    let err = Cache::<String>::local("typed", &[loader.into()]).unwrap_err();
    assert!(matches!(err, CacheError::LoaderTypeMismatch { .. }));
}

#[test]
fn test_loaded_value_uses_call_expiry() -> Result<()> {
    let cache: Cache<String> = Cache::local(
        "ttl",
        &[LoaderOption::from_fn(|key: &str| Some(key.to_string())).into()],
    )?;

    cache.get("k", &[Expiry::of(30, TimeUnit::Milliseconds).into()])?;
    std::thread::sleep(Duration::from_millis(60));

    // expired, so the loader runs again
    cache.get("k", &[])?;
    assert_eq!(cache.get_metrics()?.load_metrics().count(), 2);

    Ok(())
}

#[test]
fn test_cache_expiry_applies_when_call_has_none() -> Result<()> {
    let cache_options: [CallOption<CacheScope>; 1] =
        [Expiry::of(30, TimeUnit::Milliseconds).into()];
    let cache: Cache<String> = Cache::local("scoped", &cache_options)?;

    cache.put("scoped", "v".to_string(), &[])?;
    cache.put("explicit", "v".to_string(), &[Expiry::never().into()])?;
    std::thread::sleep(Duration::from_millis(60));

    assert_eq!(cache.get("scoped", &[])?, None);
    assert_eq!(cache.get("explicit", &[])?, Some("v".to_string()));

    Ok(())
}

#[test]
fn test_reset_metrics_keeps_gauges_and_old_snapshots() -> Result<()> {
    let cache: Cache<String> = Cache::local("reset", &[])?;
    cache.put("a", "1".to_string(), &[])?;
    cache.put("b", "2".to_string(), &[])?;
    cache.get("a", &[])?;
    cache.get("zzz", &[])?;
    cache.remove("b", &[])?;

    let before = cache.get_metrics()?;
    cache.reset_metrics();
    let after = cache.get_metrics()?;

    assert_eq!(before.hit_count(), 1);
    assert_eq!(before.miss_count(), 1);
    assert_eq!(before.put_metrics().count(), 2);
    assert_eq!(before.remove_metrics().count(), 1);

    assert_eq!(after.hit_count(), 0);
    assert_eq!(after.miss_count(), 0);
    assert_eq!(after.get_metrics().count(), 0);
    assert_eq!(after.put_metrics().count(), 0);
    assert_eq!(after.remove_metrics().count(), 0);
    assert_eq!(after.count(), before.count());
    assert_eq!(after.count(), 1);

    Ok(())
}
