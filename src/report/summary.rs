//! Fixed-width summary table, one row per combination

use std::collections::BTreeSet;

use crate::constants::{FAILED_LIST_TRUNCATE, SUCCESS_LIST_TRUNCATE, SUMMARY_RULE_WIDTH};
use crate::matrix::{CombinationStatus, CompatibilityMatrix};

pub const TITLE: &str = "KAFKA CLIENT COMPATIBILITY TEST RESULTS";

pub fn render(matrix: &CompatibilityMatrix) -> String {
    let mut out = String::new();
    out.push_str(TITLE);
    out.push('\n');
    out.push_str(&"=".repeat(SUMMARY_RULE_WIDTH));
    out.push_str("\n\n");
    out.push_str(&format!(
        "{:<8} | {:<8} | {:<25} | {:<15} | {:<8} | {:<8} | {:<15} | FAILURE_REASON\n",
        "CLIENT", "SERVER", "SUCCESSFUL_APIS", "FAILED_APIS", "REQUESTS", "ERRORS", "STATUS"
    ));
    out.push_str(&"-".repeat(SUMMARY_RULE_WIDTH));
    out.push('\n');

    for (combination, entry) in matrix.iter() {
        let status = entry.status();
        let (successful, failed, requests, errors, reason) =
            if status == CombinationStatus::SetupFailed {
                (
                    "N/A".to_string(),
                    "N/A".to_string(),
                    0,
                    0,
                    entry.failure_type.clone().unwrap_or_else(|| "UNKNOWN".to_string()),
                )
            } else {
                (
                    truncate_list(&entry.successful_apis, SUCCESS_LIST_TRUNCATE),
                    truncate_list(&entry.failed_apis, FAILED_LIST_TRUNCATE),
                    entry.total_requests,
                    entry.total_errors(),
                    String::new(),
                )
            };

        out.push_str(&format!(
            "{:<8} | {:<8} | {:<25} | {:<15} | {:<8} | {:<8} | {:<15} | {}\n",
            combination.client,
            combination.server,
            successful,
            failed,
            requests,
            errors,
            status.as_str(),
            reason
        ));
    }

    out
}

/// Comma-join a set and cut it to `max` characters followed by `...`
fn truncate_list(items: &BTreeSet<String>, max: usize) -> String {
    let joined = items.iter().map(String::as_str).collect::<Vec<_>>().join(",");
    if joined.chars().count() > max {
        let cut: String = joined.chars().take(max).collect();
        format!("{}...", cut)
    } else {
        joined
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::results::{ApiStatus, ApiUsageRecord, Combination, StatusFile};

    fn produce_record(client: &str, server: &str) -> ApiUsageRecord {
        ApiUsageRecord {
            api_key: "produce".to_string(),
            api_key_int: Some(0),
            api_version: "9".to_string(),
            client_version: client.to_string(),
            server_version: server.to_string(),
            request_count: 42,
            client_errors: 0,
            upstream_errors: 0,
            status: ApiStatus::Success,
            test_name: "t".to_string(),
            timestamp: "ts".to_string(),
            failure_type: None,
            status_message: None,
        }
    }

    #[test]
    fn test_truncate_list() {
        let short: BTreeSet<String> = ["produce(0)".to_string()].into();
        assert_eq!(truncate_list(&short, 20), "produce(0)");

        let long: BTreeSet<String> =
            ["fetch(1)", "metadata(3)", "produce(0)"].map(String::from).into();
        assert_eq!(truncate_list(&long, 20), "fetch(1),metadata(3)...");
        assert_eq!(truncate_list(&long, 10), "fetch(1),m...");
    }

    #[test]
    fn test_render_layout() {
        let records = vec![
            produce_record("3.6", "3.8"),
            StatusFile::failed("BROKER_UNREACHABLE", "down").to_record(&Combination::new("2.8", "3.8")),
        ];
        let matrix = CompatibilityMatrix::build(&records);
        let out = render(&matrix);
        let lines: Vec<&str> = out.lines().collect();

        assert_eq!(lines[0], TITLE);
        assert_eq!(lines[1].len(), 120);
        assert!(lines[3].starts_with("CLIENT   | SERVER   | SUCCESSFUL_APIS"));
        assert!(lines[5].starts_with("2.8      | 3.8      | N/A"));
        assert!(lines[5].contains("SETUP_FAILED"));
        assert!(lines[5].ends_with("| BROKER_UNREACHABLE"));
        assert!(lines[6].starts_with("3.6      | 3.8      | produce(0)"));
        assert!(lines[6].contains("| 42       |"));
        assert!(lines[6].contains("PASS"));
    }
}
