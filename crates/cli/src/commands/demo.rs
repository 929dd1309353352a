use crate::output::{summary, Reporter};
use anyhow::{anyhow, Context, Result};
use cachet_cache::{
    Cache, CacheValue, ClientConfigLoader, Expiry, LoaderOption, LocalSession,
    LocalSessionProvider, Return, Session, SessionProvider,
};
use clap::{Args, ValueEnum};
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

#[derive(Args)]
pub struct DemoArgs {
    /// Scenario to run
    #[arg(long, value_enum, default_value_t = Scenario::All)]
    scenario: Scenario,

    /// Print steps and metrics as one JSON document
    #[arg(long)]
    json: bool,

    /// Default time-to-live for local stores in milliseconds (-1 = never)
    #[arg(long, allow_hyphen_values = true)]
    default_ttl_ms: Option<i64>,

    /// Minimum time between expiry sweeps in milliseconds
    #[arg(long)]
    sweep_interval_ms: Option<u64>,

    /// Expiry used by the time-based steps, in milliseconds
    #[arg(long, default_value = "200")]
    expiry_ms: i64,

    /// Worker threads for the bulk scenario
    #[arg(long, default_value = "4")]
    threads: usize,

    /// Entries written per bulk round
    #[arg(long, default_value = "1000")]
    entries: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Scenario {
    Basic,
    Replace,
    Remove,
    Loader,
    Bulk,
    All,
}

impl Scenario {
    const EACH: [Scenario; 5] = [
        Scenario::Basic,
        Scenario::Replace,
        Scenario::Remove,
        Scenario::Loader,
        Scenario::Bulk,
    ];

    fn expand(self) -> Vec<Scenario> {
        match self {
            Scenario::All => Self::EACH.to_vec(),
            single => vec![single],
        }
    }

    fn name(self) -> &'static str {
        match self {
            Scenario::Basic => "basic",
            Scenario::Replace => "replace",
            Scenario::Remove => "remove",
            Scenario::Loader => "loader",
            Scenario::Bulk => "bulk",
            Scenario::All => "all",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Customer {
    id: String,
    name: String,
    balance: f64,
}

impl Customer {
    fn new(id: &str, name: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            balance: 0.0,
        }
    }
}

pub fn execute(args: DemoArgs) -> Result<()> {
    let config = ClientConfigLoader::load().context("failed to load client configuration")?;
    let config =
        ClientConfigLoader::apply_cli_args(config, args.default_ttl_ms, args.sweep_interval_ms)?;
    tracing::info!(source = ?config.source, "using client configuration");

    let session = LocalSessionProvider::new(config.client).create_session(&[])?;
    let expiry = Expiry::from_millis(args.expiry_ms);
    let mut reporter = Reporter::new(args.json);

    for scenario in args.scenario.expand() {
        match scenario {
            Scenario::Basic => basic(&session, &mut reporter, expiry)?,
            Scenario::Replace => replace(&session, &mut reporter, expiry)?,
            Scenario::Remove => remove(&session, &mut reporter)?,
            Scenario::Loader => loader(&session, &mut reporter, expiry)?,
            Scenario::Bulk => bulk(&session, &mut reporter, args.threads, args.entries)?,
            Scenario::All => {}
        }
    }

    reporter.finish()
}

fn fresh<V: CacheValue>(cache: &Cache<V>) -> Result<()> {
    cache.clear()?;
    cache.reset_metrics();
    Ok(())
}

fn value_is<V: CacheValue + Debug>(r: &mut Reporter, cache: &Cache<V>, key: &str) -> Result<()> {
    match cache.get(key, &[])? {
        Some(value) => r.detail(format!("{key} -> {value:?}")),
        None => r.detail(format!("{key} is absent")),
    }
    Ok(())
}

fn pause(r: &mut Reporter, expiry: Expiry) {
    let millis = u64::try_from(expiry.millis()).unwrap_or(0) + 50;
    r.step(format!("sleeping {millis}ms"));
    thread::sleep(Duration::from_millis(millis));
}

fn basic(session: &LocalSession, r: &mut Reporter, expiry: Expiry) -> Result<()> {
    r.begin(Scenario::Basic.name(), "Basic put/get");
    let cache: Cache<String> = session.cache("basic-put-get", &[])?;
    fresh(&cache)?;

    r.step("put");
    cache.put("tim", "Tim Middleton".to_string(), &[])?;
    value_is(r, &cache, "tim")?;
    r.detail(format!("entries from metrics: {}", cache.get_metrics()?.count()));

    r.step("put returning the old value");
    let old = cache.put("tim", "TIM MIDDLETON".to_string(), &[Return::OldValue.into()])?;
    r.detail(format!("old value: {old:?}"));
    value_is(r, &cache, "tim")?;

    r.step("put-if-absent on a present key");
    cache.put_if_absent("tim", "ignored".to_string(), &[])?;
    value_is(r, &cache, "tim")?;

    r.step("put-if-absent on an absent key");
    cache.put_if_absent("paul", "Paul Mackin".to_string(), &[])?;
    value_is(r, &cache, "paul")?;

    r.step(format!("put with {expiry}"));
    cache.put("luk", "Luk Ho".to_string(), &[expiry.into()])?;
    value_is(r, &cache, "luk")?;
    pause(r, expiry);
    value_is(r, &cache, "luk")?;

    r.metrics(cache.get_metrics()?);
    Ok(())
}

fn replace(session: &LocalSession, r: &mut Reporter, expiry: Expiry) -> Result<()> {
    r.begin(Scenario::Replace.name(), "Replace");
    let cache: Cache<String> = session.cache("replace", &[])?;
    fresh(&cache)?;

    r.step("put");
    cache.put("key1", "value1".to_string(), &[])?;
    value_is(r, &cache, "key1")?;

    r.step("replace a present key");
    cache.replace("key1", "new value1".to_string(), &[])?;
    value_is(r, &cache, "key1")?;

    r.step("replace only if the value is \"old value\"");
    let replaced = cache.replace_value(
        "key1",
        &"old value".to_string(),
        "newer value".to_string(),
        &[],
    )?;
    r.detail(format!("replaced: {replaced}"));
    value_is(r, &cache, "key1")?;

    r.step("replace only if the value is \"new value1\"");
    let replaced = cache.replace_value(
        "key1",
        &"new value1".to_string(),
        "much newer value".to_string(),
        &[],
    )?;
    r.detail(format!("replaced: {replaced}"));
    value_is(r, &cache, "key1")?;

    r.step(format!("replace with {expiry} returning the old value"));
    let old = cache.replace(
        "key1",
        "even newer value".to_string(),
        &[expiry.into(), Return::OldValue.into()],
    )?;
    r.detail(format!("old value: {old:?}"));
    value_is(r, &cache, "key1")?;
    pause(r, expiry);
    value_is(r, &cache, "key1")?;

    let numbers: Cache<i64> = session.cache("replace-numbers", &[])?;
    fresh(&numbers)?;
    r.step("replace a number only while unchanged");
    numbers.put("1", 1, &[])?;
    let replaced = numbers.replace_value("1", &1, 2, &[])?;
    r.detail(format!("replaced: {replaced}"));
    value_is(r, &numbers, "1")?;

    r.metrics(cache.get_metrics()?);
    r.metrics(numbers.get_metrics()?);
    Ok(())
}

fn remove(session: &LocalSession, r: &mut Reporter) -> Result<()> {
    r.begin(Scenario::Remove.name(), "Remove");
    let cache: Cache<String> = session.cache("remove", &[])?;
    fresh(&cache)?;

    r.step("put two entries");
    cache.put("car1", "Holden".to_string(), &[])?;
    cache.put("car2", "Ford".to_string(), &[])?;
    value_is(r, &cache, "car1")?;
    value_is(r, &cache, "car2")?;

    r.step("remove");
    cache.remove("car1", &[])?;
    value_is(r, &cache, "car1")?;

    r.step("remove returning the old value");
    let old = cache.remove("car2", &[Return::OldValue.into()])?;
    r.detail(format!("old value: {old:?}"));
    value_is(r, &cache, "car2")?;

    cache.put("car3", "Audi".to_string(), &[])?;
    cache.put("car4", "BMW".to_string(), &[])?;

    r.step("remove only if the value matches, when it does not");
    let removed = cache.remove_value("car3", &"Mustang".to_string())?;
    r.detail(format!("removed: {removed}"));
    value_is(r, &cache, "car3")?;

    r.step("remove only if the value matches, when it does");
    let removed = cache.remove_value("car4", &"BMW".to_string())?;
    r.detail(format!("removed: {removed}"));
    value_is(r, &cache, "car4")?;

    r.metrics(cache.get_metrics()?);
    Ok(())
}

fn loader(session: &LocalSession, r: &mut Reporter, expiry: Expiry) -> Result<()> {
    r.begin(Scenario::Loader.name(), "Cache loader");
    let loads = Arc::new(AtomicUsize::new(0));
    let option = {
        let loads = Arc::clone(&loads);
        LoaderOption::from_fn(move |key: &str| {
            loads.fetch_add(1, Ordering::Relaxed);
            let mut customer = Customer::new(key, &format!("Customer {key}"));
            customer.balance += 1000.0;
            Some(customer)
        })
    };
    let cache: Cache<Customer> = session.cache("customer-loader", &[option.into()])?;
    fresh(&cache)?;

    r.step("get a missing key, which loads it");
    value_is(r, &cache, "customer1")?;
    r.detail(format!("loads: {}", loads.load(Ordering::Relaxed)));

    r.step("get the same key again, without a load");
    value_is(r, &cache, "customer1")?;
    r.detail(format!("loads: {}", loads.load(Ordering::Relaxed)));

    r.step(format!("get a missing key with {expiry} for the loaded value"));
    let loaded = cache.get("customer2", &[expiry.into()])?;
    r.detail(format!("customer2 -> {loaded:?}"));
    pause(r, expiry);
    r.step("get it again after expiry, which loads it again");
    value_is(r, &cache, "customer2")?;
    r.detail(format!("loads: {}", loads.load(Ordering::Relaxed)));

    r.step("update a balance only while unchanged");
    if let Some(original) = cache.get("customer1", &[])? {
        let mut updated = original.clone();
        updated.balance += 100.0;
        let replaced = cache.replace_value("customer1", &original, updated, &[])?;
        r.detail(format!("replaced: {replaced}"));
    }
    value_is(r, &cache, "customer1")?;

    r.step("replace a customer returning the old value");
    let mut renamed = Customer::new("customer1", "CUSTOMER ONE");
    renamed.balance = 200.0;
    let old = cache.replace("customer1", renamed, &[Return::OldValue.into()])?;
    r.detail(format!("old value: {old:?}"));
    value_is(r, &cache, "customer1")?;

    r.metrics(cache.get_metrics()?);
    Ok(())
}

fn bulk(session: &LocalSession, r: &mut Reporter, threads: usize, entries: usize) -> Result<()> {
    r.begin(Scenario::Bulk.name(), "Bulk operations");
    let cache: Cache<String> = session.cache("bulk", &[])?;
    fresh(&cache)?;

    let payload: String = "Aa$^6hjZgHX^HH12#$%^g".chars().cycle().take(1024).collect();
    r.step(format!(
        "{threads} threads, 5 rounds of {entries} puts, gets and removes, then {} misses",
        entries / 5
    ));

    thread::scope(|scope| {
        let workers: Vec<_> = (0..threads)
            .map(|_| {
                let cache = cache.clone();
                let payload = payload.as_str();
                scope.spawn(move || exercise(&cache, payload, entries))
            })
            .collect();

        workers.into_iter().try_for_each(|worker| {
            worker
                .join()
                .map_err(|_| anyhow!("bulk worker panicked"))?
        })
    })?;

    let snapshot = cache.get_metrics()?;
    for line in summary(&snapshot).lines() {
        r.detail(line);
    }
    r.metrics(snapshot);
    Ok(())
}

fn exercise(cache: &Cache<String>, payload: &str, entries: usize) -> Result<()> {
    for _ in 0..5 {
        for i in 0..entries {
            cache.put(&format!("key-{i}"), format!("{payload}{i}"), &[])?;
        }
        for i in 0..entries {
            cache.get(&format!("key-{i}"), &[])?;
        }
        for i in 0..entries {
            cache.remove(&format!("key-{i}"), &[])?;
        }
        for i in 0..entries / 5 {
            cache.get(&format!("key-{i}"), &[])?;
        }
    }
    tracing::debug!(thread = ?thread::current().id(), "bulk worker finished");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use cachet_cache::{ClientConfig, TimeUnit};

    fn session() -> LocalSession {
        LocalSession::new(ClientConfig::default(), &[]).unwrap()
    }

    #[test]
    fn test_all_expands_to_every_scenario() {
        assert_eq!(Scenario::All.expand(), Scenario::EACH.to_vec());
        assert_eq!(Scenario::Loader.expand(), vec![Scenario::Loader]);
    }

    #[test]
    fn test_scenarios_record_metrics() {
        let session = session();
        let mut reporter = Reporter::new(true);
        let expiry = Expiry::of(10, TimeUnit::Milliseconds);

        basic(&session, &mut reporter, expiry).unwrap();
        remove(&session, &mut reporter).unwrap();
        loader(&session, &mut reporter, expiry).unwrap();

        let put_get: Cache<String> = session.cache("basic-put-get", &[]).unwrap();
        // luk expired, tim and paul remain
        assert_eq!(put_get.get_metrics().unwrap().count(), 2);

        let removes: Cache<String> = session.cache("remove", &[]).unwrap();
        assert_eq!(removes.get("car3", &[]).unwrap(), Some("Audi".to_string()));
        assert_eq!(removes.get("car4", &[]).unwrap(), None);

        let customers: Cache<Customer> = session.cache("customer-loader", &[]).unwrap();
        let stored = customers.get("customer1", &[]).unwrap().unwrap();
        assert_eq!(stored.name, "CUSTOMER ONE");
    }

    #[test]
    fn test_bulk_counts_hits_and_misses() {
        let session = session();
        let mut reporter = Reporter::new(true);
        bulk(&session, &mut reporter, 2, 50).unwrap();

        let cache: Cache<String> = session.cache("bulk", &[]).unwrap();
        let metrics = cache.get_metrics().unwrap();
        assert_eq!(metrics.count(), 0);
        assert_eq!(metrics.put_metrics().count(), 2 * 5 * 50);
        assert_eq!(metrics.hit_count() + metrics.miss_count(), 2 * 5 * 60);
    }
}
