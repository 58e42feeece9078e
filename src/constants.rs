//! Report tooling constants
//!
//! Centralizes the metric names exported by the gateway, the results-directory
//! file naming scheme and the output file names.
//!
//! # Terminology
//! - **Combination**: one (client version, server version) pair under test
//! - **Setup row**: a synthetic record emitted from a status file when the
//!   combination produced no metrics

// ===== Gateway metrics =====

/// Default Prometheus endpoint of the gateway
pub const DEFAULT_METRICS_URL: &str = "http://localhost:9190/metrics";

/// Default scrape timeout in seconds
pub const DEFAULT_SCRAPE_TIMEOUT_SECS: u64 = 10;

/// Per-request counter, labelled with `api_key` and `api_version`
pub const METRIC_REQUEST_TOTAL: &str = "kroxylicious_client_to_proxy_request_total";

/// Client-side error counters, summed into `client_errors`
pub const CLIENT_ERROR_METRICS: [&str; 2] = [
    "kroxylicious_client_to_proxy_errors_total",
    "kroxylicious_client_connection_failures_total",
];

/// Upstream error counters, summed into `upstream_errors`
pub const UPSTREAM_ERROR_METRICS: [&str; 2] = [
    "kroxylicious_upstream_connection_failures_total",
    "kroxylicious_proxy_to_upstream_errors_total",
];

pub const LABEL_API_KEY: &str = "api_key";
pub const LABEL_API_VERSION: &str = "api_version";

// ===== Results directory layout =====

/// Metrics snapshot suffix, e.g. `java3.6_server3.8_metrics.txt`
pub const METRICS_FILE_SUFFIX: &str = "_metrics.txt";

/// Setup status suffix, e.g. `java3.6_server3.8_status.txt`
pub const STATUS_FILE_SUFFIX: &str = "_status.txt";

pub const CLIENT_PREFIX: &str = "java";
pub const SERVER_PREFIX: &str = "server";

/// API key placeholder for setup rows
pub const SETUP_API_KEY: &str = "N/A";

/// API int for setup rows
pub const SETUP_API_INT: i16 = -1;

/// FAILURE_TYPE value meaning the combination came up cleanly
pub const FAILURE_TYPE_NONE: &str = "NONE";

// ===== Report files =====

pub const DETAILED_CSV_FILE: &str = "detailed_api_usage.csv";
pub const SUMMARY_FILE: &str = "compatibility_summary.txt";
pub const API_REFERENCE_FILE: &str = "api_key_reference.txt";
pub const JSON_REPORT_FILE: &str = "compatibility_report.json";

/// Width of the summary table rule
pub const SUMMARY_RULE_WIDTH: usize = 120;

/// Successful API list is cut to this many characters in the summary table
pub const SUCCESS_LIST_TRUNCATE: usize = 20;

/// Failed API list is cut to this many characters in the summary table
pub const FAILED_LIST_TRUNCATE: usize = 10;
