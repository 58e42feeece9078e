//! API key reference for the APIs observed in a run

use std::collections::BTreeSet;

use crate::results::ApiUsageRecord;

pub const TITLE: &str = "KAFKA API KEY REFERENCE";
const RULE_WIDTH: usize = 50;

pub fn render(records: &[ApiUsageRecord]) -> String {
    // Unknown APIs (no numeric key) sort after every known key
    let used: BTreeSet<(i32, &str)> = records
        .iter()
        .filter(|r| !r.is_setup_row())
        .map(|r| (r.api_key_int.map(i32::from).unwrap_or(i32::MAX), r.api_key.as_str()))
        .collect();

    let mut out = String::new();
    out.push_str(TITLE);
    out.push('\n');
    out.push_str(&"=".repeat(RULE_WIDTH));
    out.push('\n');
    out.push_str(&format!("{:<30} | {:<8}\n", "API_NAME", "API_INT"));
    out.push_str(&"-".repeat(RULE_WIDTH));
    out.push('\n');

    for (key, name) in used {
        let key = if key == i32::MAX {
            name.to_string()
        } else {
            key.to_string()
        };
        out.push_str(&format!("{:<30} | {:<8}\n", name, key));
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::MetricsSnapshot;
    use crate::results::{records_from_metrics, Combination, StatusFile};

    #[test]
    fn test_sorted_by_key_and_deduplicated() {
        let text = "kroxylicious_client_to_proxy_request_total{api_key=\"metadata\",api_version=\"12\"} 1\n\
                    kroxylicious_client_to_proxy_request_total{api_key=\"metadata\",api_version=\"9\"} 1\n\
                    kroxylicious_client_to_proxy_request_total{api_key=\"mystery\",api_version=\"0\"} 1\n\
                    kroxylicious_client_to_proxy_request_total{api_key=\"produce\",api_version=\"9\"} 1\n";
        let combination = Combination::new("3.6", "3.8");
        let mut records = records_from_metrics(&combination, &MetricsSnapshot::parse(text), "ts");
        records.push(StatusFile::success("ok").to_record(&Combination::new("1.0", "1.0")));

        let out = render(&records);
        let rows: Vec<&str> = out.lines().skip(4).collect();
        assert_eq!(rows.len(), 3);
        assert!(rows[0].starts_with("produce "));
        assert!(rows[1].starts_with("metadata "));
        assert!(rows[2].starts_with("mystery "));
        assert!(!out.contains("N/A"));
    }
}
