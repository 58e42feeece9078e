//! Machine-readable compatibility report

use std::collections::BTreeMap;

use serde::Serialize;

use crate::api_keys;
use crate::error::Result;
use crate::matrix::{CompatibilityMatrix, MatrixEntry};
use crate::results::{ApiStatus, ApiUsageRecord};

#[derive(Debug, Serialize)]
struct JsonReport<'a> {
    test_timestamp: String,
    total_combinations: usize,
    setup_successes: usize,
    setup_failures: usize,
    total_api_calls: usize,
    matrix_results: BTreeMap<String, &'a MatrixEntry>,
    api_key_mapping: BTreeMap<&'static str, i16>,
    setup_failed_combinations: Vec<String>,
}

pub fn render(records: &[ApiUsageRecord], matrix: &CompatibilityMatrix) -> Result<String> {
    let report = JsonReport {
        test_timestamp: chrono::Local::now().to_rfc3339(),
        total_combinations: matrix.len(),
        setup_successes: matrix.setup_successes(),
        setup_failures: matrix.setup_failures(),
        total_api_calls: records
            .iter()
            .filter(|r| r.status != ApiStatus::SetupFailed)
            .count(),
        matrix_results: matrix.iter().map(|(c, e)| (c.key(), e)).collect(),
        api_key_mapping: api_keys::all().iter().copied().collect(),
        setup_failed_combinations: matrix.setup_failed_keys(),
    };

    Ok(serde_json::to_string_pretty(&report)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::results::{Combination, StatusFile};

    #[test]
    fn test_json_shape() {
        let records = vec![
            StatusFile::failed("BROKER_UNREACHABLE", "down").to_record(&Combination::new("2.8", "3.8")),
            StatusFile::success("ok").to_record(&Combination::new("3.6", "3.8")),
        ];
        let matrix = CompatibilityMatrix::build(&records);
        let json: serde_json::Value = serde_json::from_str(&render(&records, &matrix).unwrap()).unwrap();

        assert_eq!(json["total_combinations"], 2);
        assert_eq!(json["setup_failures"], 1);
        assert_eq!(json["setup_successes"], 1);
        assert_eq!(json["total_api_calls"], 1);
        assert_eq!(json["setup_failed_combinations"][0], "2.8-3.8");
        assert_eq!(json["matrix_results"]["2.8-3.8"]["setup_status"], "SETUP_FAILED");
        assert_eq!(json["api_key_mapping"]["api_versions"], 18);
    }
}
