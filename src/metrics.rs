//! Gateway metrics scraping and parsing
//!
//! The gateway exposes Prometheus text format. We only care about three
//! families of counters:
//! - per-API request totals (labelled `api_key` / `api_version`)
//! - client-side error totals
//! - upstream error totals
//!
//! Label order inside `{...}` is irrelevant, and repeated samples for the same
//! (api_key, api_version) pair (e.g. one per virtual cluster) are summed.

use std::collections::BTreeMap;
use std::time::Duration;

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, warn};

use crate::constants::{
    CLIENT_ERROR_METRICS, LABEL_API_KEY, LABEL_API_VERSION, METRIC_REQUEST_TOTAL,
    UPSTREAM_ERROR_METRICS,
};
use crate::error::{ReportError, Result};

static SAMPLE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([a-zA-Z_:][a-zA-Z0-9_:]*)(?:\{(.*)\})?\s+(\S+)(?:\s+-?\d+)?$")
        .expect("sample pattern is valid")
});

static LABEL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"([a-zA-Z_][a-zA-Z0-9_]*)\s*=\s*"((?:[^"\\]|\\.)*)""#)
        .expect("label pattern is valid")
});

/// One sample line of Prometheus exposition
#[derive(Debug, Clone, PartialEq)]
pub struct MetricSample {
    pub name: String,
    pub labels: BTreeMap<String, String>,
    pub value: f64,
}

impl MetricSample {
    pub fn label(&self, name: &str) -> Option<&str> {
        self.labels.get(name).map(String::as_str)
    }
}

/// Parse a single exposition line.
///
/// Returns `Ok(None)` for comments and blank lines.
pub fn parse_line(line: &str) -> Result<Option<MetricSample>> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }

    let invalid = |reason: &str| ReportError::InvalidMetricLine {
        line: line.to_string(),
        reason: reason.to_string(),
    };

    let caps = SAMPLE_RE
        .captures(line)
        .ok_or_else(|| invalid("not a metric sample"))?;

    let mut labels = BTreeMap::new();
    if let Some(raw) = caps.get(2) {
        for label in LABEL_RE.captures_iter(raw.as_str()) {
            labels.insert(label[1].to_string(), unescape(&label[2]));
        }
    }

    let value = caps[3]
        .parse::<f64>()
        .map_err(|_| invalid("sample value is not a number"))?;

    Ok(Some(MetricSample {
        name: caps[1].to_string(),
        labels,
        value,
    }))
}

fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}

/// Aggregated request count for one (api_key, api_version) pair
#[derive(Debug, Clone, PartialEq)]
pub struct ApiUsage {
    pub api_key: String,
    pub api_version: String,
    pub request_count: u64,
}

/// Parsed view of one metrics scrape
#[derive(Debug, Clone, Default)]
pub struct MetricsSnapshot {
    samples: Vec<MetricSample>,
}

impl MetricsSnapshot {
    /// Parse a full exposition document. Unparseable lines are logged and skipped.
    pub fn parse(text: &str) -> Self {
        let mut samples = Vec::new();
        for line in text.lines() {
            match parse_line(line) {
                Ok(Some(sample)) => samples.push(sample),
                Ok(None) => {}
                Err(e) => warn!(error = %e, "Skipping metric line"),
            }
        }
        debug!(samples = samples.len(), "Parsed metrics snapshot");
        Self { samples }
    }

    pub fn samples(&self) -> &[MetricSample] {
        &self.samples
    }

    /// Request totals grouped by (api_key, api_version), in key order
    pub fn api_usage(&self) -> Vec<ApiUsage> {
        let mut grouped: BTreeMap<(String, String), f64> = BTreeMap::new();
        for sample in self.samples.iter().filter(|s| s.name == METRIC_REQUEST_TOTAL) {
            let (Some(key), Some(version)) =
                (sample.label(LABEL_API_KEY), sample.label(LABEL_API_VERSION))
            else {
                continue;
            };
            *grouped
                .entry((key.to_string(), version.to_string()))
                .or_default() += sample.value;
        }

        grouped
            .into_iter()
            .map(|((api_key, api_version), count)| ApiUsage {
                api_key,
                api_version,
                request_count: count.max(0.0) as u64,
            })
            .collect()
    }

    pub fn client_errors(&self) -> u64 {
        self.sum_of(&CLIENT_ERROR_METRICS)
    }

    pub fn upstream_errors(&self) -> u64 {
        self.sum_of(&UPSTREAM_ERROR_METRICS)
    }

    fn sum_of(&self, names: &[&str]) -> u64 {
        let total: f64 = self
            .samples
            .iter()
            .filter(|s| names.contains(&s.name.as_str()))
            .map(|s| s.value)
            .filter(|v| v.is_finite())
            .sum();
        total.max(0.0) as u64
    }
}

/// Fetch the raw exposition text from the gateway
pub async fn scrape(url: &str, timeout: Duration) -> Result<String> {
    let client = reqwest::Client::builder().timeout(timeout).build()?;
    let response = client.get(url).send().await?;

    if !response.status().is_success() {
        return Err(ReportError::HttpStatus {
            url: url.to_string(),
            status: response.status().as_u16(),
        });
    }

    Ok(response.text().await?)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"# HELP kroxylicious_client_to_proxy_request_total Requests
# TYPE kroxylicious_client_to_proxy_request_total counter
kroxylicious_client_to_proxy_request_total{virtual_cluster="demo",node_id="0",api_key="PRODUCE",api_version="9",decoded="true"} 12.0
kroxylicious_client_to_proxy_request_total{api_version="9",api_key="PRODUCE",virtual_cluster="other"} 3.0
kroxylicious_client_to_proxy_request_total{virtual_cluster="demo",api_key="METADATA",api_version="12"} 4.0
kroxylicious_client_to_proxy_errors_total{virtual_cluster="demo"} 1.0
kroxylicious_client_connection_failures_total 2
kroxylicious_upstream_connection_failures_total{virtual_cluster="demo"} 0.0
kroxylicious_proxy_to_upstream_errors_total{virtual_cluster="demo"} 5.0
process_cpu_seconds_total 1.5
"#;

    #[test]
    fn test_parse_line_with_labels() {
        let sample = parse_line(r#"foo_total{a="1",b="x y"} 3.5"#).unwrap().unwrap();
        assert_eq!(sample.name, "foo_total");
        assert_eq!(sample.label("a"), Some("1"));
        assert_eq!(sample.label("b"), Some("x y"));
        assert_eq!(sample.value, 3.5);
    }

    #[test]
    fn test_parse_line_escaped_quote() {
        let sample = parse_line(r#"foo{msg="say \"hi\""} 1"#).unwrap().unwrap();
        assert_eq!(sample.label("msg"), Some(r#"say "hi""#));
    }

    #[test]
    fn test_parse_line_with_timestamp() {
        let sample = parse_line("foo_total 7 1700000000000").unwrap().unwrap();
        assert_eq!(sample.value, 7.0);
        assert!(sample.labels.is_empty());
    }

    #[test]
    fn test_comments_and_blanks_skipped() {
        assert_eq!(parse_line("# HELP foo bar").unwrap(), None);
        assert_eq!(parse_line("   ").unwrap(), None);
    }

    #[test]
    fn test_invalid_value_rejected() {
        let err = parse_line("foo_total{a=\"1\"} abc").unwrap_err();
        assert!(matches!(err, ReportError::InvalidMetricLine { .. }));
    }

    #[test]
    fn test_api_usage_sums_duplicates() {
        let snapshot = MetricsSnapshot::parse(SAMPLE);
        let usage = snapshot.api_usage();
        assert_eq!(usage.len(), 2);
        assert_eq!(usage[0].api_key, "METADATA");
        assert_eq!(usage[0].request_count, 4);
        assert_eq!(usage[1].api_key, "PRODUCE");
        assert_eq!(usage[1].api_version, "9");
        assert_eq!(usage[1].request_count, 15);
    }

    #[test]
    fn test_error_totals() {
        let snapshot = MetricsSnapshot::parse(SAMPLE);
        assert_eq!(snapshot.client_errors(), 3);
        assert_eq!(snapshot.upstream_errors(), 5);
    }

    #[test]
    fn test_garbage_lines_do_not_poison_snapshot() {
        let text = format!("{SAMPLE}\nthis is {{ not prometheus\n");
        let snapshot = MetricsSnapshot::parse(&text);
        assert_eq!(snapshot.api_usage().len(), 2);
    }
}
