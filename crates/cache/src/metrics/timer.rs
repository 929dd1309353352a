//! Operation timers
//!
//! A [`Timer`] combines a rate meter (mean rate plus 1, 5 and 15 minute
//! exponentially weighted moving averages, ticked every five seconds) with
//! a bounded uniform reservoir of recorded durations in nanoseconds.

use super::snapshot::TimerSnapshot;
use parking_lot::Mutex;
use rand::Rng;
use std::time::{Duration, Instant};

const TICK_INTERVAL: Duration = Duration::from_secs(5);
const RESERVOIR_SIZE: usize = 1028;

#[derive(Debug)]
struct Ewma {
    alpha: f64,
    rate: f64,
    uncounted: u64,
    initialized: bool,
}

impl Ewma {
    fn over_minutes(minutes: f64) -> Self {
        let interval = TICK_INTERVAL.as_secs_f64();
        Self {
            alpha: 1.0 - (-interval / 60.0 / minutes).exp(),
            rate: 0.0,
            uncounted: 0,
            initialized: false,
        }
    }

    fn update(&mut self, n: u64) {
        self.uncounted += n;
    }

    fn tick(&mut self) {
        let instant_rate = self.uncounted as f64 / TICK_INTERVAL.as_secs_f64();
        self.uncounted = 0;
        if self.initialized {
            self.rate += self.alpha * (instant_rate - self.rate);
        } else {
            self.rate = instant_rate;
            self.initialized = true;
        }
    }

    /// Events per second
    fn rate(&self) -> f64 {
        self.rate
    }
}

#[derive(Debug)]
struct Meter {
    m1: Ewma,
    m5: Ewma,
    m15: Ewma,
    count: u64,
    started_at: Instant,
    last_tick: Instant,
}

impl Meter {
    fn new(now: Instant) -> Self {
        Self {
            m1: Ewma::over_minutes(1.0),
            m5: Ewma::over_minutes(5.0),
            m15: Ewma::over_minutes(15.0),
            count: 0,
            started_at: now,
            last_tick: now,
        }
    }

    fn mark(&mut self, now: Instant) {
        self.tick_if_necessary(now);
        self.count += 1;
        self.m1.update(1);
        self.m5.update(1);
        self.m15.update(1);
    }

    fn tick_if_necessary(&mut self, now: Instant) {
        let age = now.saturating_duration_since(self.last_tick);
        if age <= TICK_INTERVAL {
            return;
        }

        let ticks = (age.as_nanos() / TICK_INTERVAL.as_nanos()) as u32;
        self.last_tick += TICK_INTERVAL * ticks;
        for _ in 0..ticks {
            self.m1.tick();
            self.m5.tick();
            self.m15.tick();
        }
    }

    fn mean_rate(&self, now: Instant) -> f64 {
        if self.count == 0 {
            return 0.0;
        }
        let elapsed = now.saturating_duration_since(self.started_at).as_secs_f64();
        if elapsed <= 0.0 {
            0.0
        } else {
            self.count as f64 / elapsed
        }
    }
}

/// Fixed-size uniform sample of every value ever offered (Vitter's algorithm R)
#[derive(Debug)]
struct Reservoir {
    values: Vec<u64>,
    offered: u64,
}

impl Reservoir {
    fn new() -> Self {
        Self {
            values: Vec::with_capacity(RESERVOIR_SIZE),
            offered: 0,
        }
    }

    fn update(&mut self, value: u64) {
        self.offered += 1;
        if self.values.len() < RESERVOIR_SIZE {
            self.values.push(value);
            return;
        }

        let slot = rand::thread_rng().gen_range(0..self.offered);
        if let Ok(slot) = usize::try_from(slot) {
            if slot < RESERVOIR_SIZE {
                self.values[slot] = value;
            }
        }
    }

    fn sorted(&self) -> Vec<u64> {
        let mut values = self.values.clone();
        values.sort_unstable();
        values
    }
}

#[derive(Debug)]
struct TimerState {
    meter: Meter,
    reservoir: Reservoir,
}

/// Latency timer for one kind of operation
#[derive(Debug)]
pub struct Timer {
    state: Mutex<TimerState>,
}

impl Timer {
    pub fn new() -> Self {
        Self::starting_at(Instant::now())
    }

    fn starting_at(now: Instant) -> Self {
        Self {
            state: Mutex::new(TimerState {
                meter: Meter::new(now),
                reservoir: Reservoir::new(),
            }),
        }
    }

    /// Record one invocation that took `nanos`
    pub fn record(&self, nanos: u64) {
        self.record_at(nanos, Instant::now());
    }

    fn record_at(&self, nanos: u64, now: Instant) {
        let mut state = self.state.lock();
        state.meter.mark(now);
        state.reservoir.update(nanos);
    }

    pub fn count(&self) -> u64 {
        self.state.lock().meter.count
    }

    pub fn snapshot(&self) -> TimerSnapshot {
        self.snapshot_at(Instant::now())
    }

    fn snapshot_at(&self, now: Instant) -> TimerSnapshot {
        let mut state = self.state.lock();
        state.meter.tick_if_necessary(now);

        TimerSnapshot::new(
            state.meter.count,
            state.meter.mean_rate(now),
            [state.meter.m1.rate(), state.meter.m5.rate(), state.meter.m15.rate()],
            state.reservoir.sorted(),
        )
    }
}

impl Default for Timer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timer_counts_and_distribution() {
        let timer = Timer::new();
        for nanos in [10, 20, 30, 40, 50] {
            timer.record(nanos);
        }

        let snapshot = timer.snapshot();
        assert_eq!(snapshot.count(), 5);
        assert_eq!(snapshot.min(), 10);
        assert_eq!(snapshot.max(), 50);
        assert!((snapshot.mean() - 30.0).abs() < f64::EPSILON);
        assert!((snapshot.median() - 30.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_rates_decay_after_ticks() {
        let start = Instant::now();
        let timer = Timer::starting_at(start);
        for _ in 0..50 {
            timer.record_at(1_000, start);
        }

        let first = timer.snapshot_at(start + Duration::from_secs(6));
        // one tick: 50 events over a 5 second interval
        assert!((first.one_minute_rate() - 10.0).abs() < 1e-9);
        assert!((first.fifteen_minute_rate() - 10.0).abs() < 1e-9);

        let later = timer.snapshot_at(start + Duration::from_secs(66));
        assert!(later.one_minute_rate() < first.one_minute_rate());
        assert!(later.one_minute_rate() < later.five_minute_rate());
        assert!(later.five_minute_rate() < later.fifteen_minute_rate());
    }

    #[test]
    fn test_mean_rate() {
        let start = Instant::now();
        let timer = Timer::starting_at(start);
        assert_eq!(timer.snapshot_at(start).mean_rate(), 0.0);

        for _ in 0..20 {
            timer.record_at(1, start);
        }
        let snapshot = timer.snapshot_at(start + Duration::from_secs(10));
        assert!((snapshot.mean_rate() - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_reservoir_is_bounded() {
        let timer = Timer::new();
        for nanos in 0..(RESERVOIR_SIZE as u64 * 3) {
            timer.record(nanos);
        }

        let snapshot = timer.snapshot();
        assert_eq!(snapshot.count(), RESERVOIR_SIZE as u64 * 3);
        assert_eq!(snapshot.size(), RESERVOIR_SIZE);
    }
}
