//! Latency summary for `request_processing_seconds`.
//!
//! Unrelated to the ingress counts: it is fed by the daemon's synthetic
//! workload and lives for the whole process. Exposed as a Prometheus
//! summary with `_count` and `_sum` only.

use std::fmt::Write;
use std::future::Future;
use std::sync::Mutex;

use tokio::time::Instant;

use crate::prometheus::write_header;

#[derive(Debug, Default, Clone, Copy, PartialEq)]
struct Totals {
    count: u64,
    sum: f64,
}

/// Count and sum of observed durations, in seconds.
#[derive(Debug)]
pub struct LatencySummary {
    name: String,
    help: String,
    totals: Mutex<Totals>,
}

impl LatencySummary {
    pub fn new(name: impl Into<String>, help: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            help: help.into(),
            totals: Mutex::new(Totals::default()),
        }
    }

    /// `request_processing_seconds`, fed by the daemon's demo workload.
    pub fn request_processing() -> Self {
        Self::new(
            "request_processing_seconds",
            "Time spent processing request",
        )
    }

    pub fn observe(&self, seconds: f64) {
        if let Ok(mut totals) = self.totals.lock() {
            totals.count += 1;
            totals.sum += seconds;
        }
    }

    /// Await `fut` and observe how long it took.
    pub async fn time<F, T>(&self, fut: F) -> T
    where
        F: Future<Output = T>,
    {
        let started = Instant::now();
        let out = fut.await;
        self.observe(started.elapsed().as_secs_f64());
        out
    }

    pub fn count(&self) -> u64 {
        self.totals.lock().map(|t| t.count).unwrap_or(0)
    }

    pub fn sum(&self) -> f64 {
        self.totals.lock().map(|t| t.sum).unwrap_or(0.0)
    }

    pub fn render(&self) -> String {
        let totals = self.totals.lock().map(|t| *t).unwrap_or_default();
        let mut out = String::new();
        write_header(&mut out, &self.name, &self.help, "summary");
        let _ = writeln!(out, "{}_count {}", self.name, totals.count);
        let _ = writeln!(out, "{}_sum {}", self.name, totals.sum);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn observe_accumulates() {
        let summary = LatencySummary::request_processing();
        summary.observe(0.25);
        summary.observe(0.5);
        assert_eq!(summary.count(), 2);
        assert!((summary.sum() - 0.75).abs() < 1e-9);
    }

    #[test]
    fn render_empty_summary() {
        let output = LatencySummary::request_processing().render();
        assert!(output.contains("# HELP request_processing_seconds Time spent processing request"));
        assert!(output.contains("# TYPE request_processing_seconds summary"));
        assert!(output.contains("request_processing_seconds_count 0\n"));
        assert!(output.contains("request_processing_seconds_sum 0\n"));
    }

    #[test]
    fn render_after_observations() {
        let summary = LatencySummary::new("work_seconds", "Work.");
        summary.observe(1.5);
        let output = summary.render();
        assert!(output.contains("work_seconds_count 1\n"));
        assert!(output.contains("work_seconds_sum 1.5\n"));
    }

    #[tokio::test(start_paused = true)]
    async fn time_measures_future() {
        let summary = LatencySummary::request_processing();
        let value = summary
            .time(async {
                tokio::time::sleep(Duration::from_millis(300)).await;
                7
            })
            .await;

        assert_eq!(value, 7);
        assert_eq!(summary.count(), 1);
        assert!(summary.sum() >= 0.3, "sum was {}", summary.sum());
    }
}
