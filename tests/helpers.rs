// Test helpers for results-directory integration tests
//
// Builds throwaway results directories shaped like the ones a compatibility
// run leaves behind.

use std::fs;
use std::path::Path;

use tempfile::TempDir;

/// A metrics snapshot with traffic on three APIs and no errors
pub const CLEAN_METRICS: &str = r#"# HELP kroxylicious_client_to_proxy_request_total Count of requests
# TYPE kroxylicious_client_to_proxy_request_total counter
kroxylicious_client_to_proxy_request_total{virtual_cluster="demo",node_id="0",api_key="API_VERSIONS",api_version="3",decoded="true"} 4.0
kroxylicious_client_to_proxy_request_total{virtual_cluster="demo",node_id="0",api_key="METADATA",api_version="12",decoded="true"} 9.0
kroxylicious_client_to_proxy_request_total{virtual_cluster="demo",node_id="0",api_key="PRODUCE",api_version="9",decoded="true"} 20.0
kroxylicious_client_to_proxy_errors_total{virtual_cluster="demo"} 0.0
kroxylicious_upstream_connection_failures_total{virtual_cluster="demo"} 0.0
"#;

/// Traffic, but the gateway also saw upstream failures
pub const FAILING_METRICS: &str = r#"kroxylicious_client_to_proxy_request_total{api_key="PRODUCE",api_version="3",virtual_cluster="demo"} 2.0
kroxylicious_client_to_proxy_request_total{api_key="FETCH",api_version="4",virtual_cluster="demo"} 0.0
kroxylicious_upstream_connection_failures_total{virtual_cluster="demo"} 3.0
"#;

pub fn write_file(dir: &Path, name: &str, contents: &str) {
    fs::write(dir.join(name), contents).expect("write fixture");
}

/// A results directory with:
/// - 3.6/3.8: clean metrics plus a clean status file (status must be ignored)
/// - 2.8/3.8: failing metrics
/// - 3.0/2.8: setup failure only
/// - a stray file that is not a combination
pub fn sample_results_dir() -> TempDir {
    let dir = tempfile::tempdir().expect("tempdir");
    write_file(dir.path(), "java3.6_server3.8_metrics.txt", CLEAN_METRICS);
    write_file(
        dir.path(),
        "java3.6_server3.8_status.txt",
        "FAILURE_TYPE: NONE\nSETUP_SUCCESS: ok\nTIMESTAMP: 2024-05-01T10:00:00+00:00\n",
    );
    write_file(dir.path(), "java2.8_server3.8_metrics.txt", FAILING_METRICS);
    write_file(
        dir.path(),
        "java3.0_server2.8_status.txt",
        "FAILURE_TYPE: BROKER_UNREACHABLE\nSETUP_FAILED: metadata request timed out\nTIMESTAMP: 2024-05-01T10:05:00+00:00\n",
    );
    write_file(dir.path(), "gateway_metrics.txt", CLEAN_METRICS);
    dir
}
