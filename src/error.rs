//! Report tooling error types
//!
//! A single error enum for everything between "read a results directory" and
//! "write the compatibility reports", so callers deal with one type instead of
//! `Box<dyn std::error::Error>`.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while collecting, parsing or rendering compatibility results
#[derive(Error, Debug)]
pub enum ReportError {
    /// IO error while reading results or writing reports
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Metrics endpoint could not be reached or answered with a non-success status
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Metrics endpoint answered, but not with 2xx
    #[error("Metrics endpoint {url} returned status {status}")]
    HttpStatus { url: String, status: u16 },

    /// JSON serialization failure
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// File stem does not name a client/server combination
    #[error("Invalid combination file name: {0}")]
    InvalidCombination(String),

    /// A Prometheus exposition line that could not be parsed
    #[error("Invalid metric line {line}: {reason}")]
    InvalidMetricLine { line: String, reason: String },

    /// Status file contents are malformed
    #[error("Invalid status file: {0}")]
    InvalidStatus(String),

    /// Results directory does not exist
    #[error("Results directory not found: {}", .0.display())]
    MissingDirectory(PathBuf),
}

/// Result type alias for report operations
pub type Result<T> = std::result::Result<T, ReportError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ReportError::InvalidCombination("foo_metrics".to_string());
        assert_eq!(err.to_string(), "Invalid combination file name: foo_metrics");
    }

    #[test]
    fn test_missing_directory_display() {
        let err = ReportError::MissingDirectory(PathBuf::from("/tmp/nope"));
        assert!(err.to_string().contains("/tmp/nope"));
    }

    #[test]
    fn test_invalid_metric_line() {
        let err = ReportError::InvalidMetricLine {
            line: "foo{".to_string(),
            reason: "unterminated label set".to_string(),
        };
        assert!(err.to_string().contains("unterminated label set"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file missing");
        let err: ReportError = io_err.into();
        assert!(matches!(err, ReportError::Io(_)));
        assert!(err.to_string().contains("file missing"));
    }
}
