//! Report writers
//!
//! Four artifacts are produced from one set of records:
//!
//! - `detailed_api_usage.csv`: every record, one row each
//! - `compatibility_summary.txt`: one row per combination
//! - `api_key_reference.txt`: the APIs seen during the run
//! - `compatibility_report.json`: machine-readable matrix

pub mod csv;
pub mod json;
pub mod reference;
pub mod summary;

use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::constants::{API_REFERENCE_FILE, DETAILED_CSV_FILE, JSON_REPORT_FILE, SUMMARY_FILE};
use crate::error::Result;
use crate::matrix::CompatibilityMatrix;
use crate::results::ApiUsageRecord;

/// Locations of the generated reports
#[derive(Debug, Clone, PartialEq)]
pub struct ReportPaths {
    pub summary: PathBuf,
    pub detailed_csv: PathBuf,
    pub api_reference: PathBuf,
    pub json: PathBuf,
}

/// Build the matrix and write all four reports into `out_dir`
pub fn write_all(records: &[ApiUsageRecord], out_dir: &Path) -> Result<ReportPaths> {
    fs::create_dir_all(out_dir)?;
    let matrix = CompatibilityMatrix::build(records);

    let paths = ReportPaths {
        summary: out_dir.join(SUMMARY_FILE),
        detailed_csv: out_dir.join(DETAILED_CSV_FILE),
        api_reference: out_dir.join(API_REFERENCE_FILE),
        json: out_dir.join(JSON_REPORT_FILE),
    };

    fs::write(&paths.detailed_csv, csv::render(records))?;
    fs::write(&paths.summary, summary::render(&matrix))?;
    fs::write(&paths.api_reference, reference::render(records))?;
    fs::write(&paths.json, json::render(records, &matrix)?)?;

    info!(
        dir = %out_dir.display(),
        combinations = matrix.len(),
        records = records.len(),
        "Reports written"
    );
    Ok(paths)
}

/// Echo the summary table to stdout
pub fn print_summary(matrix: &CompatibilityMatrix) {
    print!("{}", summary::render(matrix));
}
