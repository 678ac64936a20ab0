//! One collection cycle per scrape.
//!
//! The collector holds only its adapters, the compiled grammar and the two
//! timeouts. Each call to [`IngressCollector::collect`] starts from zero.

use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::StreamExt;
use tracing::{debug, error, trace, warn};

use ingress_core::{
    CollectReport, Discovery, DiscoveryError, LogSource, LogSourceError, MetricFamily, MetricKind,
    MetricSample, Target,
};
use ingress_logparse::{admits, LineOutcome, LogParser};

use crate::aggregator::PathAggregator;

/// Name of the exported request counter.
pub const REQUESTS_METRIC: &str = "requests_total";
/// Help text of the exported request counter.
pub const REQUESTS_HELP: &str = "Ingress Controllers";

/// Everything read from one pod in one cycle.
#[derive(Debug, Default)]
struct PodScan {
    paths: PathAggregator,
    lines: u64,
    unmatched: u64,
    undecodable: u64,
}

/// Runs one collection cycle per scrape.
pub struct IngressCollector {
    discovery: Arc<dyn Discovery>,
    logs: Arc<dyn LogSource>,
    parser: LogParser,
    discovery_timeout: Duration,
    log_timeout: Duration,
}

impl IngressCollector {
    pub fn new(
        discovery: Arc<dyn Discovery>,
        logs: Arc<dyn LogSource>,
        parser: LogParser,
        discovery_timeout: Duration,
        log_timeout: Duration,
    ) -> Self {
        Self {
            discovery,
            logs,
            parser,
            discovery_timeout,
            log_timeout,
        }
    }

    /// Run one full cycle.
    ///
    /// A discovery failure aborts the cycle. A log retrieval failure only
    /// empties that pod's contribution.
    pub async fn collect(&self) -> Result<CollectReport, DiscoveryError> {
        let started = Instant::now();

        let targets = match tokio::time::timeout(self.discovery_timeout, self.discovery.list_targets())
            .await
        {
            Ok(Ok(targets)) => targets,
            Ok(Err(e)) => {
                error!(kind = e.kind(), error = %e, "target discovery failed");
                return Err(e);
            }
            Err(_) => {
                let e = DiscoveryError::Timeout(self.discovery_timeout);
                error!(kind = e.kind(), error = %e, "target discovery failed");
                return Err(e);
            }
        };

        let per_pod = futures::future::join_all(targets.iter().map(|t| self.collect_pod(t))).await;

        let mut family = MetricFamily::new(REQUESTS_METRIC, REQUESTS_HELP, MetricKind::Counter);
        let mut failed_pods = 0;
        let mut unmatched_lines = 0;
        let mut undecodable_lines = 0;

        for (target, outcome) in targets.iter().zip(per_pod) {
            match outcome {
                Ok(scan) => {
                    debug!(
                        %target,
                        lines = scan.lines,
                        unmatched = scan.unmatched,
                        undecodable = scan.undecodable,
                        "pod logs scanned"
                    );
                    if scan.undecodable > 0 {
                        warn!(%target, undecodable = scan.undecodable, "pod log contained lines that are not valid UTF-8");
                    }
                    unmatched_lines += scan.unmatched;
                    undecodable_lines += scan.undecodable;
                    for (path, count) in scan.paths.into_snapshot() {
                        if count == 0 {
                            continue;
                        }
                        family.samples.push(MetricSample {
                            namespace: target.namespace.clone(),
                            pod: target.pod.clone(),
                            path,
                            count,
                        });
                    }
                }
                Err(e) => {
                    failed_pods += 1;
                    warn!(%target, kind = e.kind(), error = %e, "log retrieval failed, pod contributes no samples");
                }
            }
        }

        debug!(
            targets = targets.len(),
            failed_pods,
            unmatched_lines,
            undecodable_lines,
            samples = family.samples.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "collection cycle finished"
        );

        Ok(CollectReport {
            family,
            targets: targets.len(),
            failed_pods,
            unmatched_lines,
            undecodable_lines,
        })
    }

    /// Retrieve and aggregate one pod, bounded by the log timeout.
    async fn collect_pod(&self, target: &Target) -> Result<PodScan, LogSourceError> {
        match tokio::time::timeout(self.log_timeout, self.aggregate_pod(target)).await {
            Ok(outcome) => outcome,
            Err(_) => Err(LogSourceError::Timeout {
                target: target.clone(),
                after: self.log_timeout,
            }),
        }
    }

    async fn aggregate_pod(&self, target: &Target) -> Result<PodScan, LogSourceError> {
        let mut lines = self.logs.stream_lines(target).await?;
        let mut scan = PodScan::default();

        while let Some(line) = lines.next().await {
            let line = line?;
            scan.lines += 1;
            match self.parser.parse_line(&line) {
                LineOutcome::Record(record) => {
                    if admits(&record.url) {
                        scan.paths.record(&record.path);
                    }
                }
                LineOutcome::Unmatched => scan.unmatched += 1,
                LineOutcome::Undecodable => {
                    trace!(%target, "skipping line that is not valid UTF-8");
                    scan.undecodable += 1;
                }
            }
        }

        Ok(scan)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ingress_core::memory::{StaticDiscovery, StaticLogSource};

    const FOO_LINE: &str = r#"10.0.0.1 - - [t] "GET /foo HTTP/1.1" 200 12 "/foo" "ua" "-""#;
    const BAR_LINE: &str = r#"10.0.0.1 - - [t] "GET /bar HTTP/1.1" 200 5 "-" "ua" "-""#;
    const HEALTH_LINE: &str = r#"10.0.0.2 - - [t] "GET /health HTTP/1.1" 200 2 "/health" "kube-probe" "-""#;

    fn collector(discovery: StaticDiscovery, logs: StaticLogSource) -> IngressCollector {
        IngressCollector::new(
            Arc::new(discovery),
            Arc::new(logs),
            LogParser::new().unwrap(),
            Duration::from_secs(5),
            Duration::from_secs(5),
        )
    }

    fn pod_a() -> Target {
        Target::new("ns1", "podA")
    }

    fn pod_b() -> Target {
        Target::new("ns1", "podB")
    }

    #[tokio::test]
    async fn filtered_url_is_not_counted() {
        let c = collector(
            StaticDiscovery::new(vec![pod_a()]),
            StaticLogSource::new().with_lines(pod_a(), [FOO_LINE, BAR_LINE]),
        );

        let report = c.collect().await.unwrap();
        assert_eq!(report.family.name, "requests_total");
        assert_eq!(report.family.help, "Ingress Controllers");
        assert_eq!(report.family.samples.len(), 1);
        assert_eq!(report.family.get("ns1", "podA", "/foo"), Some(1));
        assert_eq!(report.family.get("ns1", "podA", "/bar"), None);
        assert_eq!(report.targets, 1);
        assert_eq!(report.failed_pods, 0);
    }

    #[tokio::test]
    async fn pods_are_not_merged() {
        let c = collector(
            StaticDiscovery::new(vec![pod_a(), pod_b()]),
            StaticLogSource::new()
                .with_lines(pod_a(), [HEALTH_LINE])
                .with_lines(pod_b(), [HEALTH_LINE]),
        );

        let report = c.collect().await.unwrap();
        assert_eq!(report.family.samples.len(), 2);
        assert_eq!(report.family.get("ns1", "podA", "/health"), Some(1));
        assert_eq!(report.family.get("ns1", "podB", "/health"), Some(1));
    }

    #[tokio::test]
    async fn each_occurrence_counts_once() {
        let c = collector(
            StaticDiscovery::new(vec![pod_a()]),
            StaticLogSource::new().with_lines(pod_a(), [FOO_LINE, FOO_LINE, FOO_LINE, HEALTH_LINE]),
        );

        let report = c.collect().await.unwrap();
        assert_eq!(report.family.get("ns1", "podA", "/foo"), Some(3));
        assert_eq!(report.family.get("ns1", "podA", "/health"), Some(1));
        assert_eq!(report.family.total_for(&pod_a()), 4);
    }

    #[tokio::test]
    async fn non_matching_lines_are_ignored() {
        let garbage: Vec<Vec<u8>> = vec![
            Vec::new(),
            b"NGINX Ingress controller".to_vec(),
            vec![0xff, 0xfe, 0x00],
            FOO_LINE.as_bytes().to_vec(),
        ];
        let c = collector(
            StaticDiscovery::new(vec![pod_a()]),
            StaticLogSource::new().with_lines(pod_a(), garbage),
        );

        let report = c.collect().await.unwrap();
        assert_eq!(report.family.samples.len(), 1);
        assert_eq!(report.family.total_for(&pod_a()), 1);
    }

    #[tokio::test]
    async fn undecodable_lines_are_counted_apart_from_unmatched() {
        let c = collector(
            StaticDiscovery::new(vec![pod_a()]),
            StaticLogSource::new().with_lines(pod_a(), vec![vec![0xff, 0xfe], b"banner".to_vec()]),
        );

        let report = c.collect().await.unwrap();
        assert!(report.family.samples.is_empty());
        assert_eq!(report.failed_pods, 0);
        assert_eq!(report.undecodable_lines, 1);
        assert_eq!(report.unmatched_lines, 1);
    }

    #[tokio::test]
    async fn filtered_lines_are_not_unmatched() {
        let c = collector(
            StaticDiscovery::new(vec![pod_a()]),
            StaticLogSource::new().with_lines(pod_a(), [FOO_LINE, BAR_LINE]),
        );

        let report = c.collect().await.unwrap();
        assert_eq!(report.unmatched_lines, 0);
        assert_eq!(report.undecodable_lines, 0);
    }

    #[tokio::test]
    async fn retrieval_failure_is_isolated() {
        let c = collector(
            StaticDiscovery::new(vec![pod_a(), pod_b()]),
            StaticLogSource::new()
                .with_lines(pod_a(), [FOO_LINE, FOO_LINE])
                .with_lines_then_exit(pod_b(), [FOO_LINE]),
        );

        let report = c.collect().await.unwrap();
        assert_eq!(report.family.get("ns1", "podA", "/foo"), Some(2));
        assert_eq!(report.family.total_for(&pod_b()), 0);
        assert_eq!(report.failed_pods, 1);
        assert_eq!(report.targets, 2);
    }

    #[tokio::test]
    async fn spawn_failure_is_isolated() {
        let c = collector(
            StaticDiscovery::new(vec![pod_a(), pod_b()]),
            StaticLogSource::new()
                .with_spawn_failure(pod_a())
                .with_lines(pod_b(), [HEALTH_LINE]),
        );

        let report = c.collect().await.unwrap();
        assert_eq!(report.family.total_for(&pod_a()), 0);
        assert_eq!(report.family.get("ns1", "podB", "/health"), Some(1));
        assert_eq!(report.failed_pods, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn hung_pod_times_out_without_stalling_siblings() {
        let c = IngressCollector::new(
            Arc::new(StaticDiscovery::new(vec![pod_a(), pod_b()])),
            Arc::new(
                StaticLogSource::new()
                    .with_hang(pod_a(), [FOO_LINE])
                    .with_lines(pod_b(), [HEALTH_LINE]),
            ),
            LogParser::new().unwrap(),
            Duration::from_secs(5),
            Duration::from_secs(2),
        );

        let report = c.collect().await.unwrap();
        assert_eq!(report.family.total_for(&pod_a()), 0);
        assert_eq!(report.family.get("ns1", "podB", "/health"), Some(1));
        assert_eq!(report.failed_pods, 1);
    }

    #[tokio::test]
    async fn discovery_failure_aborts_cycle() {
        let c = collector(
            StaticDiscovery::unreachable("dial tcp 192.168.49.2:8443: connect: connection refused"),
            StaticLogSource::new().with_lines(pod_a(), [FOO_LINE]),
        );

        let err = c.collect().await.unwrap_err();
        assert!(matches!(err, DiscoveryError::Unreachable(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn slow_discovery_times_out() {
        let c = IngressCollector::new(
            Arc::new(StaticDiscovery::new(vec![pod_a()]).with_delay(Duration::from_secs(60))),
            Arc::new(StaticLogSource::new().with_lines(pod_a(), [FOO_LINE])),
            LogParser::new().unwrap(),
            Duration::from_secs(3),
            Duration::from_secs(5),
        );

        let err = c.collect().await.unwrap_err();
        assert!(matches!(err, DiscoveryError::Timeout(d) if d == Duration::from_secs(3)));
    }

    #[tokio::test]
    async fn cycles_are_independent() {
        let c = collector(
            StaticDiscovery::new(vec![pod_a()]),
            StaticLogSource::new().with_lines(pod_a(), [FOO_LINE, FOO_LINE]),
        );

        let first = c.collect().await.unwrap();
        let second = c.collect().await.unwrap();
        assert_eq!(first.family.get("ns1", "podA", "/foo"), Some(2));
        assert_eq!(second.family.get("ns1", "podA", "/foo"), Some(2));
    }

    #[tokio::test]
    async fn no_targets_yields_empty_family() {
        let c = collector(StaticDiscovery::new(Vec::new()), StaticLogSource::new());
        let report = c.collect().await.unwrap();
        assert!(report.family.samples.is_empty());
        assert_eq!(report.targets, 0);
    }
}
