//! ingress-metrics: request counting for ingress controller pods.
//!
//! Every scrape runs one collection cycle from scratch; nothing is carried
//! over between cycles.
//!
//! # Architecture
//!
//! ```text
//! IngressCollector::collect()
//!   ├── Discovery::list_targets()         (bounded by discovery timeout)
//!   ├── per target, concurrently          (bounded by log timeout)
//!   │   ├── LogSource::stream_lines()
//!   │   ├── LogParser → filter::admits
//!   │   └── PathAggregator::record()
//!   └── join → MetricFamily "requests_total"
//!
//! Prometheus exposition
//!   └── render_report() / LatencySummary::render() → text/plain
//! ```

pub mod aggregator;
pub mod collector;
pub mod prometheus;
pub mod summary;

pub use aggregator::PathAggregator;
pub use collector::IngressCollector;
pub use prometheus::{render_family, render_report};
pub use summary::LatencySummary;
