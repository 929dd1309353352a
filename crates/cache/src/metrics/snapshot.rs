//! Point-in-time metric snapshots

use crate::backend::ServerMetrics;
use serde::Serialize;
use std::fmt;

/// Immutable view of a [`super::Timer`]
///
/// Durations are in nanoseconds, rates in events per second.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimerSnapshot {
    count: u64,
    mean_rate: f64,
    one_minute_rate: f64,
    five_minute_rate: f64,
    fifteen_minute_rate: f64,
    min: u64,
    max: u64,
    mean: f64,
    std_dev: f64,
    p50: f64,
    p75: f64,
    p95: f64,
    p98: f64,
    p99: f64,
    p999: f64,
    #[serde(skip)]
    values: Vec<u64>,
}

impl TimerSnapshot {
    /// `values` must be sorted ascending
    pub(crate) fn new(count: u64, mean_rate: f64, rates: [f64; 3], values: Vec<u64>) -> Self {
        let (mean, std_dev) = mean_and_std_dev(&values);

        Self {
            count,
            mean_rate,
            one_minute_rate: rates[0],
            five_minute_rate: rates[1],
            fifteen_minute_rate: rates[2],
            min: values.first().copied().unwrap_or(0),
            max: values.last().copied().unwrap_or(0),
            mean,
            std_dev,
            p50: quantile(&values, 0.5),
            p75: quantile(&values, 0.75),
            p95: quantile(&values, 0.95),
            p98: quantile(&values, 0.98),
            p99: quantile(&values, 0.99),
            p999: quantile(&values, 0.999),
            values,
        }
    }

    /// An empty snapshot
    pub fn empty() -> Self {
        Self::new(0, 0.0, [0.0; 3], Vec::new())
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn mean_rate(&self) -> f64 {
        self.mean_rate
    }

    pub fn one_minute_rate(&self) -> f64 {
        self.one_minute_rate
    }

    pub fn five_minute_rate(&self) -> f64 {
        self.five_minute_rate
    }

    pub fn fifteen_minute_rate(&self) -> f64 {
        self.fifteen_minute_rate
    }

    /// Value at `quantile` (clamped to `0.0..=1.0`) of the sampled durations
    pub fn percentile(&self, quantile_value: f64) -> f64 {
        quantile(&self.values, quantile_value)
    }

    pub fn median(&self) -> f64 {
        self.p50
    }

    pub fn p75(&self) -> f64 {
        self.p75
    }

    pub fn p95(&self) -> f64 {
        self.p95
    }

    pub fn p98(&self) -> f64 {
        self.p98
    }

    pub fn p99(&self) -> f64 {
        self.p99
    }

    pub fn p999(&self) -> f64 {
        self.p999
    }

    pub fn min(&self) -> u64 {
        self.min
    }

    pub fn max(&self) -> u64 {
        self.max
    }

    pub fn mean(&self) -> f64 {
        self.mean
    }

    pub fn std_dev(&self) -> f64 {
        self.std_dev
    }

    /// Number of sampled durations backing the distribution
    pub fn size(&self) -> usize {
        self.values.len()
    }
}

impl fmt::Display for TimerSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[count = {}, mean rate = {}, 1-min rate = {}, 5-min rate = {}, 15-min rate = {}, \
             50% = {}, 75% = {}, 95% = {}, 98% = {}, 99% = {}, 99.9% = {}, \
             max = {}, avg = {}, min = {}, stddev = {}]",
            self.count,
            self.mean_rate,
            self.one_minute_rate,
            self.five_minute_rate,
            self.fifteen_minute_rate,
            self.p50,
            self.p75,
            self.p95,
            self.p98,
            self.p99,
            self.p999,
            self.max,
            self.mean,
            self.min,
            self.std_dev
        )
    }
}

/// Linear interpolation between the two samples around `q * (n + 1)`
fn quantile(sorted: &[u64], q: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let q = if q.is_nan() { 0.0 } else { q.clamp(0.0, 1.0) };

    let pos = q * (sorted.len() + 1) as f64;
    let index = pos as usize;

    if index < 1 {
        return sorted[0] as f64;
    }
    if index >= sorted.len() {
        return sorted[sorted.len() - 1] as f64;
    }

    let lower = sorted[index - 1] as f64;
    let upper = sorted[index] as f64;
    lower + (pos - pos.floor()) * (upper - lower)
}

fn mean_and_std_dev(values: &[u64]) -> (f64, f64) {
    if values.is_empty() {
        return (0.0, 0.0);
    }

    let n = values.len() as f64;
    let mean = values.iter().map(|&v| v as f64).sum::<f64>() / n;
    if values.len() == 1 {
        return (mean, 0.0);
    }

    let variance = values
        .iter()
        .map(|&v| {
            let diff = v as f64 - mean;
            diff * diff
        })
        .sum::<f64>()
        / (n - 1.0);

    (mean, variance.sqrt())
}

/// Everything recorded for one cache handle plus the backend gauges at
/// the time of the snapshot
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricsSnapshot {
    cache_name: String,
    get: TimerSnapshot,
    put: TimerSnapshot,
    remove: TimerSnapshot,
    load: TimerSnapshot,
    hit_count: u64,
    miss_count: u64,
    hit_ratio: f64,
    miss_ratio: f64,
    count: i64,
    size: i64,
}

impl MetricsSnapshot {
    pub(crate) fn new(
        cache_name: String,
        timers: [TimerSnapshot; 4],
        hit_count: u64,
        miss_count: u64,
        gauges: ServerMetrics,
    ) -> Self {
        let [get, put, remove, load] = timers;
        let gets = hit_count + miss_count;
        let (hit_ratio, miss_ratio) = if gets == 0 {
            (0.0, 0.0)
        } else {
            (hit_count as f64 / gets as f64, miss_count as f64 / gets as f64)
        };

        Self {
            cache_name,
            get,
            put,
            remove,
            load,
            hit_count,
            miss_count,
            hit_ratio,
            miss_ratio,
            count: gauges.count,
            size: gauges.size,
        }
    }

    pub fn cache_name(&self) -> &str {
        &self.cache_name
    }

    pub fn get_metrics(&self) -> &TimerSnapshot {
        &self.get
    }

    pub fn put_metrics(&self) -> &TimerSnapshot {
        &self.put
    }

    pub fn remove_metrics(&self) -> &TimerSnapshot {
        &self.remove
    }

    pub fn load_metrics(&self) -> &TimerSnapshot {
        &self.load
    }

    pub fn hit_count(&self) -> u64 {
        self.hit_count
    }

    pub fn miss_count(&self) -> u64 {
        self.miss_count
    }

    /// Hits as a fraction of gets, `0.0` before the first get
    pub fn hit_ratio(&self) -> f64 {
        self.hit_ratio
    }

    pub fn miss_ratio(&self) -> f64 {
        self.miss_ratio
    }

    /// Entry count reported by the backend
    pub fn count(&self) -> i64 {
        self.count
    }

    /// Aggregate byte size reported by the backend, `-1` when unknown
    pub fn size(&self) -> i64 {
        self.size
    }
}

impl fmt::Display for MetricsSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "CacheMetrics{{")?;
        writeln!(f, "\tcache:  {}", self.cache_name)?;
        writeln!(f, "\tget:    {}", self.get)?;
        writeln!(f, "\tput:    {}", self.put)?;
        writeln!(f, "\tremove: {}", self.remove)?;
        writeln!(f, "\tload:   {}", self.load)?;
        writeln!(
            f,
            "\thits:   [count = {}, ratio = {}]",
            self.hit_count, self.hit_ratio
        )?;
        writeln!(
            f,
            "\tmisses: [count = {}, ratio = {}]",
            self.miss_count, self.miss_ratio
        )?;
        writeln!(f, "\tcount:  {}", self.count)?;
        writeln!(f, "\tsize:   {}", self.size)?;
        write!(f, "}}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quantile_interpolation() {
        let values: Vec<u64> = (1..=5).collect();
        assert_eq!(quantile(&values, 0.0), 1.0);
        assert_eq!(quantile(&values, 0.5), 3.0);
        assert_eq!(quantile(&values, 0.75), 4.5);
        assert_eq!(quantile(&values, 1.0), 5.0);
        assert_eq!(quantile(&[], 0.5), 0.0);
        assert_eq!(quantile(&[7], 0.99), 7.0);
    }

    #[test]
    fn test_std_dev() {
        let (mean, std_dev) = mean_and_std_dev(&[2, 4, 4, 4, 5, 5, 7, 9]);
        assert!((mean - 5.0).abs() < 1e-12);
        assert!((std_dev - 2.138_089_935).abs() < 1e-6);
        assert_eq!(mean_and_std_dev(&[3]), (3.0, 0.0));
    }

    #[test]
    fn test_ratios() {
        let empty = TimerSnapshot::empty;
        let none = MetricsSnapshot::new(
            "c".into(),
            [empty(), empty(), empty(), empty()],
            0,
            0,
            ServerMetrics::new(0, -1),
        );
        assert_eq!(none.hit_ratio(), 0.0);
        assert_eq!(none.miss_ratio(), 0.0);

        let some = MetricsSnapshot::new(
            "c".into(),
            [empty(), empty(), empty(), empty()],
            3,
            1,
            ServerMetrics::new(2, -1),
        );
        assert_eq!(some.hit_ratio(), 0.75);
        assert_eq!(some.miss_ratio(), 0.25);
        assert_eq!(some.count(), 2);
        assert_eq!(some.size(), -1);
    }

    #[test]
    fn test_display_layout() {
        let empty = TimerSnapshot::empty;
        let snapshot = MetricsSnapshot::new(
            "books".into(),
            [empty(), empty(), empty(), empty()],
            1,
            1,
            ServerMetrics::new(4, -1),
        );
        let text = snapshot.to_string();
        assert!(text.starts_with("CacheMetrics{\n\tcache:  books\n"));
        assert!(text.contains("\thits:   [count = 1, ratio = 0.5]"));
        assert!(text.ends_with("\tsize:   -1\n}"));
    }
}
