//! Domain types shared by the parser, collector and adapters.

use std::fmt;

/// One front-end pod to scrape: the namespace it lives in and its name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Target {
    pub namespace: String,
    pub pod: String,
}

impl Target {
    pub fn new(namespace: impl Into<String>, pod: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            pod: pod.into(),
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.pod)
    }
}

/// Fields extracted from one access-log line.
///
/// Every field is kept as text. `status` and `bytes_sent` are digit-only
/// strings by construction but are not converted here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRecord {
    pub remote: String,
    pub time: String,
    pub method: String,
    /// Empty when the quoted request carried only a method.
    pub path: String,
    pub status: String,
    pub bytes_sent: String,
    /// The quoted field after the byte count (referrer position).
    pub url: String,
    pub user_agent: String,
}

/// One exported sample: a request count for (namespace, pod, path).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricSample {
    pub namespace: String,
    pub pod: String,
    pub path: String,
    pub count: u64,
}

/// Prometheus metric type of a family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricKind {
    Counter,
    Gauge,
}

impl MetricKind {
    pub fn as_str(self) -> &'static str {
        match self {
            MetricKind::Counter => "counter",
            MetricKind::Gauge => "gauge",
        }
    }
}

/// A named group of samples emitted together for one scrape.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricFamily {
    pub name: String,
    pub help: String,
    pub kind: MetricKind,
    pub samples: Vec<MetricSample>,
}

impl MetricFamily {
    pub fn new(name: impl Into<String>, help: impl Into<String>, kind: MetricKind) -> Self {
        Self {
            name: name.into(),
            help: help.into(),
            kind,
            samples: Vec::new(),
        }
    }

    /// Sum of counts emitted for one target.
    pub fn total_for(&self, target: &Target) -> u64 {
        self.samples
            .iter()
            .filter(|s| s.namespace == target.namespace && s.pod == target.pod)
            .map(|s| s.count)
            .sum()
    }

    /// Count for a single (namespace, pod, path) bucket, if emitted.
    pub fn get(&self, namespace: &str, pod: &str, path: &str) -> Option<u64> {
        self.samples
            .iter()
            .find(|s| s.namespace == namespace && s.pod == pod && s.path == path)
            .map(|s| s.count)
    }
}

/// Outcome of one successful collection cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct CollectReport {
    pub family: MetricFamily,
    /// Targets returned by discovery this cycle.
    pub targets: usize,
    /// Targets whose log retrieval failed or timed out this cycle.
    pub failed_pods: usize,
    /// Lines from successful pods that did not fit the access-log grammar.
    pub unmatched_lines: u64,
    /// Lines from successful pods that were not valid UTF-8.
    pub undecodable_lines: u64,
}
