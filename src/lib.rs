//! Kafka client/server compatibility matrix tooling
//!
//! Turns the artifacts of a compatibility run into reports:
//!
//! - **api_keys**: protocol API name/number reference
//! - **metrics**: gateway Prometheus scraping and parsing
//! - **results**: results-directory collection and the status-file format
//! - **matrix**: per-combination aggregation
//! - **report**: CSV, summary table, API reference and JSON writers
//!
//! The `kafka_test` workspace member runs the scenarios that generate the
//! traffic these reports describe.

pub mod api_keys;
pub mod config;
pub mod constants;
pub mod error;
pub mod logging;
pub mod matrix;
pub mod metrics;
pub mod report;
pub mod results;

pub use config::ReportConfig;
pub use error::{ReportError, Result};
pub use matrix::{CombinationStatus, CompatibilityMatrix, MatrixEntry};
pub use metrics::MetricsSnapshot;
pub use results::{ApiStatus, ApiUsageRecord, Combination, ResultsCollector, StatusFile};
