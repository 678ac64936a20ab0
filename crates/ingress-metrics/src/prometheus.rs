//! Prometheus text exposition format.
//!
//! Renders the per-cycle request family and the cycle gauges for scraping
//! by a Prometheus server or compatible agent.

use std::fmt::Write;

use ingress_core::{CollectReport, MetricFamily, MetricSample};

/// Content type of the text exposition format.
pub const CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

/// Render one request family with `namespace`, `ingress_controller_pod`
/// and `path` labels.
///
/// Samples are sorted so output is stable between identical cycles.
pub fn render_family(family: &MetricFamily) -> String {
    let mut out = String::new();
    write_header(&mut out, &family.name, &family.help, family.kind.as_str());

    let mut samples: Vec<&MetricSample> = family.samples.iter().collect();
    samples.sort_by(|a, b| {
        (&a.namespace, &a.pod, &a.path).cmp(&(&b.namespace, &b.pod, &b.path))
    });

    for s in samples {
        let _ = writeln!(
            out,
            "{}{{namespace=\"{}\",ingress_controller_pod=\"{}\",path=\"{}\"}} {}",
            family.name,
            escape_label_value(&s.namespace),
            escape_label_value(&s.pod),
            escape_label_value(&s.path),
            s.count
        );
    }

    out
}

/// Render a full cycle: the request family plus the cycle gauges.
pub fn render_report(report: &CollectReport) -> String {
    let mut out = render_family(&report.family);

    write_header(
        &mut out,
        "ingress_exporter_targets",
        "Ingress controller pods discovered in this scrape.",
        "gauge",
    );
    let _ = writeln!(out, "ingress_exporter_targets {}", report.targets);

    write_header(
        &mut out,
        "ingress_exporter_log_retrieval_failures",
        "Pods whose logs could not be retrieved in this scrape.",
        "gauge",
    );
    let _ = writeln!(
        out,
        "ingress_exporter_log_retrieval_failures {}",
        report.failed_pods
    );

    write_header(
        &mut out,
        "ingress_exporter_unmatched_lines",
        "Log lines in this scrape that did not fit the access-log format.",
        "gauge",
    );
    let _ = writeln!(
        out,
        "ingress_exporter_unmatched_lines {}",
        report.unmatched_lines
    );

    write_header(
        &mut out,
        "ingress_exporter_undecodable_lines",
        "Log lines in this scrape that were not valid UTF-8.",
        "gauge",
    );
    let _ = writeln!(
        out,
        "ingress_exporter_undecodable_lines {}",
        report.undecodable_lines
    );

    out
}

pub(crate) fn write_header(out: &mut String, name: &str, help: &str, kind: &str) {
    let _ = writeln!(out, "# HELP {name} {}", escape_help(help));
    let _ = writeln!(out, "# TYPE {name} {kind}");
}

/// Escape `\`, `"` and newlines in a label value.
pub fn escape_label_value(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            '"' => escaped.push_str("\\\""),
            '\n' => escaped.push_str("\\n"),
            other => escaped.push(other),
        }
    }
    escaped
}

fn escape_help(help: &str) -> String {
    help.replace('\\', "\\\\").replace('\n', "\\n")
}
