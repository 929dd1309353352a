//! Scenario output in text or JSON form

use anyhow::Result;
use cachet_cache::MetricsSnapshot;
use serde::Serialize;

/// One scenario as recorded for JSON output
#[derive(Debug, Serialize)]
pub struct ScenarioRun {
    pub scenario: &'static str,
    pub steps: Vec<String>,
    pub metrics: Vec<MetricsSnapshot>,
}

/// Prints scenario progress as it happens, or collects it for one JSON document
pub struct Reporter {
    json: bool,
    runs: Vec<ScenarioRun>,
}

impl Reporter {
    pub fn new(json: bool) -> Self {
        Self {
            json,
            runs: Vec::new(),
        }
    }

    pub fn begin(&mut self, scenario: &'static str, title: &str) {
        if !self.json {
            println!();
            println!("=== {title} ===");
        }
        self.runs.push(ScenarioRun {
            scenario,
            steps: Vec::new(),
            metrics: Vec::new(),
        });
    }

    pub fn step(&mut self, message: impl Into<String>) {
        self.push_line(message.into(), "");
    }

    /// A result line belonging to the previous step
    pub fn detail(&mut self, message: impl Into<String>) {
        self.push_line(message.into(), "    ");
    }

    pub fn metrics(&mut self, snapshot: MetricsSnapshot) {
        if !self.json {
            println!("{snapshot}");
        }
        if let Some(run) = self.runs.last_mut() {
            run.metrics.push(snapshot);
        }
    }

    pub fn finish(self) -> Result<()> {
        if self.json {
            println!("{}", serde_json::to_string_pretty(&self.runs)?);
        }
        Ok(())
    }

    fn push_line(&mut self, line: String, indent: &str) {
        if !self.json {
            println!("{indent}{line}");
        }
        if let Some(run) = self.runs.last_mut() {
            run.steps.push(line);
        }
    }
}

const NANOS_PER_MILLI: f64 = 1_000_000.0;

/// Human summary of the counters and latencies in `snapshot`
pub fn summary(snapshot: &MetricsSnapshot) -> String {
    let mut out = format!(
        "entries: {}, hit ratio: {:.2}%",
        snapshot.count(),
        snapshot.hit_ratio() * 100.0
    );
    let timers = [
        ("gets", snapshot.get_metrics()),
        ("puts", snapshot.put_metrics()),
        ("removes", snapshot.remove_metrics()),
        ("loads", snapshot.load_metrics()),
    ];
    for (title, timer) in timers {
        if timer.count() == 0 {
            continue;
        }
        out.push_str(&format!(
            "\n{title:<8} count={}, mean={:.4}ms, p99={:.4}ms, max={:.4}ms, mean rate={:.1}/sec",
            timer.count(),
            timer.mean() / NANOS_PER_MILLI,
            timer.p99() / NANOS_PER_MILLI,
            timer.max() as f64 / NANOS_PER_MILLI,
            timer.mean_rate(),
        ));
    }
    out
}
