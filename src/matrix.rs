//! Compatibility matrix
//!
//! Folds per-API records into one entry per (client, server) combination.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::Serialize;

use crate::results::{ApiStatus, ApiUsageRecord, Combination};

/// Whether the combination's environment came up
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SetupStatus {
    #[default]
    Unknown,
    Success,
    SetupFailed,
}

/// Overall verdict for one combination
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CombinationStatus {
    Pass,
    Fail,
    NoData,
    SetupFailed,
}

impl CombinationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CombinationStatus::Pass => "PASS",
            CombinationStatus::Fail => "FAIL",
            CombinationStatus::NoData => "NO_DATA",
            CombinationStatus::SetupFailed => "SETUP_FAILED",
        }
    }
}

impl fmt::Display for CombinationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Aggregated view of a single combination
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MatrixEntry {
    pub apis: BTreeSet<String>,
    pub api_ints: BTreeSet<String>,
    pub api_versions: BTreeSet<String>,
    pub total_requests: u64,
    /// Combination-wide counter, taken from the last record rather than summed
    pub total_client_errors: u64,
    /// Combination-wide counter, taken from the last record rather than summed
    pub total_upstream_errors: u64,
    pub successful_apis: BTreeSet<String>,
    pub failed_apis: BTreeSet<String>,
    pub setup_status: SetupStatus,
    pub failure_type: Option<String>,
    pub status_message: Option<String>,
}

impl MatrixEntry {
    fn absorb(&mut self, record: &ApiUsageRecord) {
        if record.status == ApiStatus::SetupFailed {
            self.setup_status = SetupStatus::SetupFailed;
            self.failure_type = Some(
                record
                    .failure_type
                    .clone()
                    .unwrap_or_else(|| "UNKNOWN".to_string()),
            );
            self.status_message = Some(
                record
                    .status_message
                    .clone()
                    .unwrap_or_else(|| "Setup failed".to_string()),
            );
            return;
        }

        if self.setup_status != SetupStatus::SetupFailed {
            self.setup_status = SetupStatus::Success;
        }

        // A clean status file with no metrics says nothing about API usage
        if record.is_setup_row() {
            self.failure_type = record.failure_type.clone();
            self.status_message = record.status_message.clone();
            return;
        }

        self.apis.insert(record.api_key.clone());
        self.api_ints.insert(
            record
                .api_key_int
                .map(|k| k.to_string())
                .unwrap_or_else(|| record.api_key.clone()),
        );
        self.api_versions.insert(record.api_version.clone());
        self.total_requests += record.request_count;
        self.total_client_errors = record.client_errors;
        self.total_upstream_errors = record.upstream_errors;

        match record.status {
            ApiStatus::Success => {
                self.successful_apis.insert(record.api_label());
            }
            ApiStatus::Error => {
                self.failed_apis.insert(record.api_label());
            }
            ApiStatus::NoTraffic | ApiStatus::SetupFailed => {}
        }
    }

    pub fn total_errors(&self) -> u64 {
        self.total_client_errors + self.total_upstream_errors
    }

    pub fn status(&self) -> CombinationStatus {
        if self.setup_status == SetupStatus::SetupFailed {
            CombinationStatus::SetupFailed
        } else if self.total_errors() == 0 && self.total_requests > 0 {
            CombinationStatus::Pass
        } else if self.total_errors() > 0 {
            CombinationStatus::Fail
        } else {
            CombinationStatus::NoData
        }
    }
}

/// All combinations of a run, ordered by (client, server)
#[derive(Debug, Clone, Default)]
pub struct CompatibilityMatrix {
    entries: BTreeMap<Combination, MatrixEntry>,
}

impl CompatibilityMatrix {
    pub fn build(records: &[ApiUsageRecord]) -> Self {
        let mut entries: BTreeMap<Combination, MatrixEntry> = BTreeMap::new();
        for record in records {
            entries
                .entry(record.combination())
                .or_default()
                .absorb(record);
        }
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, combination: &Combination) -> Option<&MatrixEntry> {
        self.entries.get(combination)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Combination, &MatrixEntry)> {
        self.entries.iter()
    }

    pub fn setup_successes(&self) -> usize {
        self.count_setup(SetupStatus::Success)
    }

    pub fn setup_failures(&self) -> usize {
        self.count_setup(SetupStatus::SetupFailed)
    }

    fn count_setup(&self, status: SetupStatus) -> usize {
        self.entries
            .values()
            .filter(|e| e.setup_status == status)
            .count()
    }

    /// `client-server` keys of combinations whose setup failed
    pub fn setup_failed_keys(&self) -> Vec<String> {
        self.entries
            .iter()
            .filter(|(_, e)| e.setup_status == SetupStatus::SetupFailed)
            .map(|(c, _)| c.key())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::results::StatusFile;

    fn record(client: &str, server: &str, api: &str, count: u64, errors: u64) -> ApiUsageRecord {
        ApiUsageRecord {
            api_key: api.to_string(),
            api_key_int: crate::api_keys::api_key_for(api),
            api_version: "1".to_string(),
            client_version: client.to_string(),
            server_version: server.to_string(),
            request_count: count,
            client_errors: errors,
            upstream_errors: 0,
            status: ApiStatus::classify(count, errors, 0),
            test_name: format!("java{}_server{}", client, server),
            timestamp: "ts".to_string(),
            failure_type: None,
            status_message: None,
        }
    }

    #[test]
    fn test_pass_combination() {
        let records = vec![
            record("3.6", "3.8", "produce", 10, 0),
            record("3.6", "3.8", "metadata", 4, 0),
        ];
        let matrix = CompatibilityMatrix::build(&records);
        let entry = matrix.get(&Combination::new("3.6", "3.8")).unwrap();

        assert_eq!(entry.total_requests, 14);
        assert_eq!(entry.status(), CombinationStatus::Pass);
        assert!(entry.successful_apis.contains("produce(0)"));
        assert!(entry.successful_apis.contains("metadata(3)"));
        assert_eq!(entry.setup_status, SetupStatus::Success);
    }

    #[test]
    fn test_errors_taken_from_last_record() {
        let records = vec![
            record("2.8", "3.8", "produce", 1, 2),
            record("2.8", "3.8", "fetch", 1, 2),
        ];
        let matrix = CompatibilityMatrix::build(&records);
        let entry = matrix.get(&Combination::new("2.8", "3.8")).unwrap();

        assert_eq!(entry.total_client_errors, 2);
        assert_eq!(entry.status(), CombinationStatus::Fail);
        assert_eq!(entry.failed_apis.len(), 2);
    }

    #[test]
    fn test_setup_failure() {
        let combination = Combination::new("3.0", "2.8");
        let records = vec![StatusFile::failed("BROKER_UNREACHABLE", "timeout").to_record(&combination)];
        let matrix = CompatibilityMatrix::build(&records);
        let entry = matrix.get(&combination).unwrap();

        assert_eq!(entry.status(), CombinationStatus::SetupFailed);
        assert_eq!(entry.failure_type.as_deref(), Some("BROKER_UNREACHABLE"));
        assert!(entry.apis.is_empty());
        assert_eq!(matrix.setup_failures(), 1);
        assert_eq!(matrix.setup_failed_keys(), vec!["3.0-2.8".to_string()]);
    }

    #[test]
    fn test_clean_status_without_metrics_is_no_data() {
        let combination = Combination::new("3.7", "3.7");
        let records = vec![StatusFile::success("ok").to_record(&combination)];
        let matrix = CompatibilityMatrix::build(&records);
        let entry = matrix.get(&combination).unwrap();

        assert_eq!(entry.setup_status, SetupStatus::Success);
        assert_eq!(entry.status(), CombinationStatus::NoData);
        assert!(entry.successful_apis.is_empty());
    }

    #[test]
    fn test_entries_ordered() {
        let records = vec![
            record("3.6", "3.8", "produce", 1, 0),
            record("2.8", "3.8", "produce", 1, 0),
            record("3.6", "2.8", "produce", 1, 0),
        ];
        let matrix = CompatibilityMatrix::build(&records);
        let keys: Vec<String> = matrix.iter().map(|(c, _)| c.key()).collect();
        assert_eq!(keys, vec!["2.8-3.8", "3.6-2.8", "3.6-3.8"]);
    }
}
