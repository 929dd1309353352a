//! Integration tests for concurrent cache operations

use cachet_cache::{
    Backend, Cache, ClientConfig, Expiry, LoaderOption, LocalSession, LocalStore, Return, Session,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;

#[test]
fn test_put_if_absent_race_has_one_winner() {
    for round in 0..20 {
        let session = LocalSession::new(ClientConfig::default(), &[]).unwrap();
        let cache: Cache<String> = session.cache("race", &[]).unwrap();
        let num_threads = 8;
        let barrier = Arc::new(Barrier::new(num_threads));

        let handles: Vec<_> = (0..num_threads)
            .map(|i| {
                let cache = cache.clone();
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    let mine = format!("value-{i}");
                    barrier.wait();
                    let previous = cache
                        .put_if_absent("key", mine.clone(), &[Return::OldValue.into()])
                        .unwrap();
                    (mine, previous)
                })
            })
            .collect();

        let results: Vec<(String, Option<String>)> =
            handles.into_iter().map(|h| h.join().unwrap()).collect();

        let winners: Vec<&String> = results
            .iter()
            .filter(|(_, previous)| previous.is_none())
            .map(|(mine, _)| mine)
            .collect();
        assert_eq!(winners.len(), 1, "round {round}: exactly one insert wins");

        let stored = cache.get("key", &[]).unwrap().unwrap();
        assert_eq!(&stored, winners[0]);

        // every loser saw the winning value
        for (_, previous) in results.iter().filter(|(_, p)| p.is_some()) {
            assert_eq!(previous.as_ref(), Some(&stored));
        }
    }
}

#[test]
fn test_racing_loaders_agree_on_one_value() {
    let loads = Arc::new(AtomicUsize::new(0));
    let num_threads = 8;
    let barrier = Arc::new(Barrier::new(num_threads));

    let loader = {
        let loads = Arc::clone(&loads);
        LoaderOption::from_fn(move |key: &str| {
            let n = loads.fetch_add(1, Ordering::SeqCst);
            Some(format!("{key}-{n}"))
        })
    };

    let session = LocalSession::new(ClientConfig::default(), &[]).unwrap();
    let cache: Cache<String> = session.cache("loaded", &[loader.into()]).unwrap();

    let handles: Vec<_> = (0..num_threads)
        .map(|_| {
            let cache = cache.clone();
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                cache.get("k", &[]).unwrap()
            })
        })
        .collect();

    let seen: Vec<String> = handles
        .into_iter()
        .map(|h| h.join().unwrap().unwrap())
        .collect();

    let stored = cache.get("k", &[]).unwrap().unwrap();
    assert!(seen.iter().all(|value| value == &stored));

    // no in-flight de-duplication: at least one load, at most one per caller
    let total = loads.load(Ordering::SeqCst);
    assert!((1..=num_threads).contains(&total));
    let metrics = cache.get_metrics().unwrap();
    assert_eq!(metrics.load_metrics().count() as usize, total);
}

#[test]
fn test_concurrent_mixed_operations() {
    let store: Arc<LocalStore<u64>> = Arc::new(LocalStore::new("mixed"));
    let num_threads = 8;
    let per_thread = 500u64;
    let barrier = Arc::new(Barrier::new(num_threads));

    let handles: Vec<_> = (0..num_threads as u64)
        .map(|t| {
            let store = Arc::clone(&store);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                for i in 0..per_thread {
                    let key = format!("t{t}-{i}");
                    let ttl = if i % 2 == 0 {
                        Expiry::never()
                    } else {
                        Expiry::from_millis(1)
                    };
                    store.put(&key, i, ttl, false).unwrap();
                    store.get(&key).unwrap();
                    if i % 5 == 0 {
                        store.remove(&key, false).unwrap();
                    }
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    // only never-expiring, unremoved keys are guaranteed to survive
    for t in 0..num_threads as u64 {
        for i in (0..per_thread).filter(|i| i % 2 == 0 && i % 5 != 0) {
            assert_eq!(store.get(&format!("t{t}-{i}")).unwrap(), Some(i));
        }
    }
}

#[test]
fn test_clear_while_writing() {
    let store: Arc<LocalStore<u32>> = Arc::new(LocalStore::new("clear"));
    let barrier = Arc::new(Barrier::new(3));

    let writers: Vec<_> = (0..2)
        .map(|w| {
            let store = Arc::clone(&store);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                for i in 0..1_000u32 {
                    store
                        .put(&format!("w{w}-{i}"), i, Expiry::never(), false)
                        .unwrap();
                }
            })
        })
        .collect();

    barrier.wait();
    for _ in 0..10 {
        store.clear().unwrap();
    }
    for writer in writers {
        writer.join().unwrap();
    }

    store.clear().unwrap();
    assert!(store.is_empty());
}
