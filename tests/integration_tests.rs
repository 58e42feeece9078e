// Integration tests for the results-directory to reports pipeline
//
// Covers:
// - Collecting metrics and status files from disk
// - Status files only counting for combinations without metrics
// - Writing all four report files

mod helpers;

use std::fs;

use gateway_compat::constants::{
    API_REFERENCE_FILE, DETAILED_CSV_FILE, JSON_REPORT_FILE, SUMMARY_FILE,
};
use gateway_compat::{
    report, ApiStatus, Combination, CombinationStatus, CompatibilityMatrix, ReportError,
    ResultsCollector,
};
use helpers::{sample_results_dir, write_file, CLEAN_METRICS};

#[test]
fn test_collects_metrics_and_status_files() {
    let dir = sample_results_dir();
    let mut collector = ResultsCollector::new();
    let added = collector.process_dir(dir.path()).unwrap();

    // 3 APIs for 3.6/3.8, 2 for 2.8/3.8, 1 setup row for 3.0/2.8
    assert_eq!(added, 6);

    let records = collector.records();
    assert!(records
        .iter()
        .filter(|r| r.client_version == "3.6")
        .all(|r| !r.is_setup_row()));

    let setup: Vec<_> = records.iter().filter(|r| r.is_setup_row()).collect();
    assert_eq!(setup.len(), 1);
    assert_eq!(setup[0].client_version, "3.0");
    assert_eq!(setup[0].status, ApiStatus::SetupFailed);
    assert_eq!(
        setup[0].status_message.as_deref(),
        Some("metadata request timed out")
    );
}

#[test]
fn test_matrix_from_directory() {
    let dir = sample_results_dir();
    let mut collector = ResultsCollector::new();
    collector.process_dir(dir.path()).unwrap();
    let matrix = CompatibilityMatrix::build(collector.records());

    assert_eq!(matrix.len(), 3);

    let clean = matrix.get(&Combination::new("3.6", "3.8")).unwrap();
    assert_eq!(clean.status(), CombinationStatus::Pass);
    assert_eq!(clean.total_requests, 33);
    assert!(clean.successful_apis.contains("PRODUCE(0)"));

    let failing = matrix.get(&Combination::new("2.8", "3.8")).unwrap();
    assert_eq!(failing.status(), CombinationStatus::Fail);
    assert_eq!(failing.total_upstream_errors, 3);
    assert!(failing.failed_apis.contains("FETCH(1)"));

    let setup = matrix.get(&Combination::new("3.0", "2.8")).unwrap();
    assert_eq!(setup.status(), CombinationStatus::SetupFailed);
}

#[test]
fn test_write_all_reports() {
    let dir = sample_results_dir();
    let out = tempfile::tempdir().unwrap();
    let mut collector = ResultsCollector::new();
    collector.process_dir(dir.path()).unwrap();

    let paths = report::write_all(collector.records(), out.path()).unwrap();
    assert_eq!(paths.summary, out.path().join(SUMMARY_FILE));

    let csv = fs::read_to_string(out.path().join(DETAILED_CSV_FILE)).unwrap();
    assert_eq!(csv.lines().count(), 7);

    let summary = fs::read_to_string(out.path().join(SUMMARY_FILE)).unwrap();
    assert!(summary.contains("BROKER_UNREACHABLE"));
    assert!(summary.contains("PASS"));
    assert!(summary.contains("FAIL"));

    let reference = fs::read_to_string(out.path().join(API_REFERENCE_FILE)).unwrap();
    assert!(reference.contains("API_VERSIONS"));
    assert!(!reference.contains("N/A"));

    let json: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(out.path().join(JSON_REPORT_FILE)).unwrap())
            .unwrap();
    assert_eq!(json["total_combinations"], 3);
    assert_eq!(json["setup_failures"], 1);
    assert_eq!(json["total_api_calls"], 5);
}

#[test]
fn test_missing_directory() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("nope");
    let err = ResultsCollector::new().process_dir(&missing).unwrap_err();
    assert!(matches!(err, ReportError::MissingDirectory(_)));
}

#[test]
fn test_unreadable_metrics_file_is_skipped() {
    let dir = tempfile::tempdir().unwrap();
    write_file(dir.path(), "java3.6_server3.8_metrics.txt", CLEAN_METRICS);
    fs::write(dir.path().join("java2.8_server3.8_metrics.txt"), [0xff, 0xfe, 0x00]).unwrap();

    let mut collector = ResultsCollector::new();
    let added = collector.process_dir(dir.path()).unwrap();

    assert_eq!(added, 3);
    assert!(collector
        .records()
        .iter()
        .all(|r| r.combination() == Combination::new("3.6", "3.8")));
}

#[test]
fn test_empty_directory_yields_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let mut collector = ResultsCollector::new();
    assert_eq!(collector.process_dir(dir.path()).unwrap(), 0);
    assert!(CompatibilityMatrix::build(collector.records()).is_empty());
}
