//! Results directory collection
//!
//! A run leaves one or two files per (client, server) combination:
//!
//! - `java<client>_server<server>_metrics.txt`: gateway metrics scraped after
//!   the suite ran
//! - `java<client>_server<server>_status.txt`: setup outcome, written even when
//!   the suite never got to run
//!
//! Metrics files are authoritative. A status file only contributes a row when
//! its combination produced no metrics records.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::api_keys::api_key_for;
use crate::constants::{
    CLIENT_PREFIX, FAILURE_TYPE_NONE, METRICS_FILE_SUFFIX, SERVER_PREFIX, SETUP_API_INT,
    SETUP_API_KEY, STATUS_FILE_SUFFIX,
};
use crate::error::{ReportError, Result};
use crate::metrics::MetricsSnapshot;

/// One (client version, server version) pair under test
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Combination {
    pub client: String,
    pub server: String,
}

impl Combination {
    pub fn new(client: impl Into<String>, server: impl Into<String>) -> Self {
        Self {
            client: client.into(),
            server: server.into(),
        }
    }

    /// Parse a file stem such as `java3.6_server3.8` or `java3.6_server3.8_metrics`.
    ///
    /// The `java`/`server` segments may appear in any position.
    pub fn from_file_stem(stem: &str) -> Result<Self> {
        let invalid = || ReportError::InvalidCombination(stem.to_string());

        if !stem.contains(CLIENT_PREFIX) || !stem.contains(SERVER_PREFIX) {
            return Err(invalid());
        }

        let parts: Vec<&str> = stem.split('_').collect();
        let client = parts
            .iter()
            .find_map(|p| p.strip_prefix(CLIENT_PREFIX))
            .filter(|v| !v.is_empty())
            .ok_or_else(invalid)?;
        let server = parts
            .iter()
            .find_map(|p| p.strip_prefix(SERVER_PREFIX))
            .filter(|v| !v.is_empty())
            .ok_or_else(invalid)?;

        Ok(Self::new(client, server))
    }

    /// Parse a full file name, dropping the metrics/status suffix first
    pub fn from_file_name(name: &str) -> Result<Self> {
        let stem = name
            .strip_suffix(METRICS_FILE_SUFFIX)
            .or_else(|| name.strip_suffix(STATUS_FILE_SUFFIX))
            .unwrap_or(name);
        Self::from_file_stem(stem)
    }

    /// `java<client>_server<server>`
    pub fn file_stem(&self) -> String {
        format!("{}{}_{}{}", CLIENT_PREFIX, self.client, SERVER_PREFIX, self.server)
    }

    pub fn metrics_file_name(&self) -> String {
        format!("{}{}", self.file_stem(), METRICS_FILE_SUFFIX)
    }

    pub fn status_file_name(&self) -> String {
        format!("{}{}", self.file_stem(), STATUS_FILE_SUFFIX)
    }

    /// Matrix key, `client-server`
    pub fn key(&self) -> String {
        format!("{}-{}", self.client, self.server)
    }
}

impl fmt::Display for Combination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "client {} / server {}", self.client, self.server)
    }
}

/// Outcome of one API (or setup) row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApiStatus {
    Success,
    Error,
    NoTraffic,
    SetupFailed,
}

impl ApiStatus {
    /// Classify a metrics row. Error totals are combination-wide, so any
    /// error marks every API of that combination as ERROR.
    pub fn classify(request_count: u64, client_errors: u64, upstream_errors: u64) -> Self {
        if client_errors == 0 && upstream_errors == 0 && request_count > 0 {
            ApiStatus::Success
        } else if client_errors > 0 || upstream_errors > 0 {
            ApiStatus::Error
        } else {
            ApiStatus::NoTraffic
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ApiStatus::Success => "SUCCESS",
            ApiStatus::Error => "ERROR",
            ApiStatus::NoTraffic => "NO_TRAFFIC",
            ApiStatus::SetupFailed => "SETUP_FAILED",
        }
    }
}

impl fmt::Display for ApiStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One row of `detailed_api_usage.csv`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApiUsageRecord {
    pub api_key: String,
    /// Numeric key; `None` when the gateway reported a name we do not know
    pub api_key_int: Option<i16>,
    pub api_version: String,
    pub client_version: String,
    pub server_version: String,
    pub request_count: u64,
    pub client_errors: u64,
    pub upstream_errors: u64,
    pub status: ApiStatus,
    pub test_name: String,
    pub timestamp: String,
    pub failure_type: Option<String>,
    pub status_message: Option<String>,
}

impl ApiUsageRecord {
    /// True for the synthetic row derived from a status file
    pub fn is_setup_row(&self) -> bool {
        self.api_key == SETUP_API_KEY
    }

    /// `name(int)`, or `name(name)` for unknown APIs
    pub fn api_label(&self) -> String {
        match self.api_key_int {
            Some(key) => format!("{}({})", self.api_key, key),
            None => format!("{}({})", self.api_key, self.api_key),
        }
    }

    pub fn combination(&self) -> Combination {
        Combination::new(&self.client_version, &self.server_version)
    }
}

/// Build one record per (api_key, api_version) from a metrics snapshot
pub fn records_from_metrics(
    combination: &Combination,
    snapshot: &MetricsSnapshot,
    timestamp: &str,
) -> Vec<ApiUsageRecord> {
    let client_errors = snapshot.client_errors();
    let upstream_errors = snapshot.upstream_errors();
    let test_name = combination.file_stem();

    snapshot
        .api_usage()
        .into_iter()
        .map(|usage| ApiUsageRecord {
            api_key_int: api_key_for(&usage.api_key),
            status: ApiStatus::classify(usage.request_count, client_errors, upstream_errors),
            api_key: usage.api_key,
            api_version: usage.api_version,
            client_version: combination.client.clone(),
            server_version: combination.server.clone(),
            request_count: usage.request_count,
            client_errors,
            upstream_errors,
            test_name: test_name.clone(),
            timestamp: timestamp.to_string(),
            failure_type: None,
            status_message: None,
        })
        .collect()
}

/// Setup outcome of one combination, stored as `KEY: value` lines
#[derive(Debug, Clone, PartialEq)]
pub struct StatusFile {
    /// `NONE` when setup succeeded, otherwise a short failure category
    pub failure_type: String,
    pub message: String,
    pub timestamp: String,
}

impl StatusFile {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            failure_type: FAILURE_TYPE_NONE.to_string(),
            message: message.into(),
            timestamp: now(),
        }
    }

    pub fn failed(failure_type: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            failure_type: failure_type.into(),
            message: message.into(),
            timestamp: now(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.failure_type == FAILURE_TYPE_NONE
    }

    pub fn parse(text: &str) -> Result<Self> {
        let mut failure_type = None;
        let mut setup_failed = None;
        let mut setup_success = None;
        let mut timestamp = None;

        for line in text.lines() {
            let Some((key, value)) = line.split_once(':') else {
                continue;
            };
            let value = value.trim().to_string();
            match key.trim() {
                "FAILURE_TYPE" => failure_type = Some(value),
                "SETUP_FAILED" => setup_failed = Some(value),
                "SETUP_SUCCESS" => setup_success = Some(value),
                "TIMESTAMP" => timestamp = Some(value),
                other => debug!(key = other, "Ignoring unknown status key"),
            }
        }

        if failure_type.is_none() && setup_failed.is_none() && setup_success.is_none() {
            return Err(ReportError::InvalidStatus(
                "no FAILURE_TYPE or SETUP_* line".to_string(),
            ));
        }

        Ok(Self {
            failure_type: failure_type.unwrap_or_else(|| "UNKNOWN".to_string()),
            message: setup_failed
                .or(setup_success)
                .unwrap_or_else(|| "Unknown status".to_string()),
            timestamp: timestamp.unwrap_or_else(now),
        })
    }

    pub fn render(&self) -> String {
        let setup_key = if self.is_success() {
            "SETUP_SUCCESS"
        } else {
            "SETUP_FAILED"
        };
        format!(
            "FAILURE_TYPE: {}\n{}: {}\nTIMESTAMP: {}\n",
            single_line(&self.failure_type),
            setup_key,
            single_line(&self.message),
            self.timestamp
        )
    }

    pub fn read_from(path: &Path) -> Result<Self> {
        Self::parse(&fs::read_to_string(path)?)
    }

    pub fn write_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, self.render())?;
        Ok(())
    }

    /// The single `N/A` row standing in for a combination without metrics
    pub fn to_record(&self, combination: &Combination) -> ApiUsageRecord {
        ApiUsageRecord {
            api_key: SETUP_API_KEY.to_string(),
            api_key_int: Some(SETUP_API_INT),
            api_version: SETUP_API_KEY.to_string(),
            client_version: combination.client.clone(),
            server_version: combination.server.clone(),
            request_count: 0,
            client_errors: 0,
            upstream_errors: 0,
            status: if self.is_success() {
                ApiStatus::Success
            } else {
                ApiStatus::SetupFailed
            },
            test_name: combination.file_stem(),
            timestamp: self.timestamp.clone(),
            failure_type: Some(self.failure_type.clone()),
            status_message: Some(self.message.clone()),
        }
    }
}

/// Each field occupies exactly one line of the file
fn single_line(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn now() -> String {
    chrono::Local::now().to_rfc3339()
}

/// Accumulates records from one or more results directories
#[derive(Debug, Default)]
pub struct ResultsCollector {
    records: Vec<ApiUsageRecord>,
}

impl ResultsCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> &[ApiUsageRecord] {
        &self.records
    }

    pub fn into_records(self) -> Vec<ApiUsageRecord> {
        self.records
    }

    fn has_records_for(&self, combination: &Combination) -> bool {
        self.records.iter().any(|r| {
            r.client_version == combination.client && r.server_version == combination.server
        })
    }

    /// Add records parsed from one metrics document
    pub fn add_metrics(&mut self, combination: &Combination, metrics_text: &str) -> usize {
        let snapshot = MetricsSnapshot::parse(metrics_text);
        let records = records_from_metrics(combination, &snapshot, &now());
        let added = records.len();
        self.records.extend(records);
        added
    }

    /// Process every metrics and status file in `dir`.
    ///
    /// Returns the number of records added.
    pub fn process_dir(&mut self, dir: &Path) -> Result<usize> {
        if !dir.is_dir() {
            return Err(ReportError::MissingDirectory(dir.to_path_buf()));
        }

        let before = self.records.len();
        let (metrics_files, status_files) = list_result_files(dir)?;
        info!(
            dir = %dir.display(),
            metrics = metrics_files.len(),
            status = status_files.len(),
            "Processing results directory"
        );

        for path in &metrics_files {
            let Some(combination) = combination_for(path) else {
                continue;
            };
            let text = match fs::read_to_string(path) {
                Ok(text) => text,
                Err(e) => {
                    warn!(file = %path.display(), error = %e, "Unreadable metrics file");
                    continue;
                }
            };
            let added = self.add_metrics(&combination, &text);
            info!(%combination, apis = added, "Parsed metrics file");
        }

        for path in &status_files {
            let Some(combination) = combination_for(path) else {
                continue;
            };
            if self.has_records_for(&combination) {
                debug!(%combination, "Metrics already present, ignoring status file");
                continue;
            }
            match StatusFile::read_from(path) {
                Ok(status) => {
                    info!(
                        %combination,
                        failure_type = %status.failure_type,
                        "Recorded setup status"
                    );
                    self.records.push(status.to_record(&combination));
                }
                Err(e) => warn!(file = %path.display(), error = %e, "Unreadable status file"),
            }
        }

        Ok(self.records.len() - before)
    }
}

fn combination_for(path: &Path) -> Option<Combination> {
    let name = path.file_name()?.to_string_lossy();
    match Combination::from_file_name(&name) {
        Ok(combination) => Some(combination),
        Err(e) => {
            warn!(file = %name, error = %e, "Skipping file");
            None
        }
    }
}

/// Sorted (metrics, status) file lists
fn list_result_files(dir: &Path) -> Result<(Vec<PathBuf>, Vec<PathBuf>)> {
    let mut metrics = Vec::new();
    let mut status = Vec::new();

    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        let Some(name) = path.file_name().map(|n| n.to_string_lossy().into_owned()) else {
            continue;
        };
        if name.ends_with(METRICS_FILE_SUFFIX) {
            metrics.push(path);
        } else if name.ends_with(STATUS_FILE_SUFFIX) {
            status.push(path);
        }
    }

    metrics.sort();
    status.sort();
    Ok((metrics, status))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_combination_from_stem() {
        let c = Combination::from_file_stem("java3.6_server3.8").unwrap();
        assert_eq!(c, Combination::new("3.6", "3.8"));
        assert_eq!(c.key(), "3.6-3.8");
    }

    #[test]
    fn test_combination_from_file_name() {
        let c = Combination::from_file_name("java2.8.1_server3.7.0_metrics.txt").unwrap();
        assert_eq!(c.client, "2.8.1");
        assert_eq!(c.server, "3.7.0");

        let c = Combination::from_file_name("java3.0_server2.8_status.txt").unwrap();
        assert_eq!(c.status_file_name(), "java3.0_server2.8_status.txt");
    }

    #[test]
    fn test_combination_rejects_unrelated_names() {
        assert!(Combination::from_file_stem("gateway_metrics").is_err());
        assert!(Combination::from_file_stem("java_server3.8").is_err());
        assert!(Combination::from_file_stem("javaserver").is_err());
    }

    #[test]
    fn test_classify() {
        assert_eq!(ApiStatus::classify(5, 0, 0), ApiStatus::Success);
        assert_eq!(ApiStatus::classify(5, 1, 0), ApiStatus::Error);
        assert_eq!(ApiStatus::classify(0, 0, 2), ApiStatus::Error);
        assert_eq!(ApiStatus::classify(0, 0, 0), ApiStatus::NoTraffic);
    }

    #[test]
    fn test_status_file_parse() {
        let text = "FAILURE_TYPE: BROKER_UNREACHABLE\n\
                    SETUP_FAILED: could not fetch metadata\n\
                    TIMESTAMP: 2024-01-02T03:04:05+00:00\n";
        let status = StatusFile::parse(text).unwrap();
        assert_eq!(status.failure_type, "BROKER_UNREACHABLE");
        assert_eq!(status.message, "could not fetch metadata");
        assert_eq!(status.timestamp, "2024-01-02T03:04:05+00:00");
        assert!(!status.is_success());
    }

    #[test]
    fn test_status_file_render_parse() {
        let status = StatusFile::success("all scenarios passed");
        let parsed = StatusFile::parse(&status.render()).unwrap();
        assert_eq!(parsed, status);
        assert!(status.render().contains("SETUP_SUCCESS: all scenarios passed"));
    }

    #[test]
    fn test_status_file_multiline_message() {
        let status = StatusFile::failed("TEST_FAILURES", "eos failed:\n  Expected: 5\r\n  Actual: 4");
        let parsed = StatusFile::parse(&status.render()).unwrap();
        assert_eq!(parsed.message, "eos failed: Expected: 5 Actual: 4");
        assert_eq!(parsed.failure_type, "TEST_FAILURES");
        assert_eq!(parsed.timestamp, status.timestamp);
    }

    #[test]
    fn test_status_file_rejects_empty() {
        assert!(matches!(
            StatusFile::parse("hello\n"),
            Err(ReportError::InvalidStatus(_))
        ));
    }

    #[test]
    fn test_setup_row() {
        let combination = Combination::new("3.6", "3.8");
        let record = StatusFile::failed("TEST_FAILURES", "2 scenarios failed").to_record(&combination);
        assert!(record.is_setup_row());
        assert_eq!(record.api_key_int, Some(-1));
        assert_eq!(record.status, ApiStatus::SetupFailed);
        assert_eq!(record.test_name, "java3.6_server3.8");
    }

    #[test]
    fn test_records_from_metrics() {
        let text = "kroxylicious_client_to_proxy_request_total{api_key=\"PRODUCE\",api_version=\"9\"} 3\n\
                    kroxylicious_client_to_proxy_request_total{api_key=\"SHINY_NEW_API\",api_version=\"0\"} 1\n";
        let snapshot = MetricsSnapshot::parse(text);
        let records = records_from_metrics(&Combination::new("3.6", "3.8"), &snapshot, "ts");

        assert_eq!(records.len(), 2);
        let produce = records.iter().find(|r| r.api_key == "PRODUCE").unwrap();
        assert_eq!(produce.api_key_int, Some(0));
        assert_eq!(produce.status, ApiStatus::Success);
        assert_eq!(produce.api_label(), "PRODUCE(0)");

        let unknown = records.iter().find(|r| r.api_key == "SHINY_NEW_API").unwrap();
        assert_eq!(unknown.api_key_int, None);
        assert_eq!(unknown.api_label(), "SHINY_NEW_API(SHINY_NEW_API)");
    }
}
