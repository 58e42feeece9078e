// Configuration for the compatibility report tooling
//
// Values come from the environment with sensible defaults; the CLI overrides
// individual fields on top of `ReportConfig::load()`.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::constants::{DEFAULT_METRICS_URL, DEFAULT_SCRAPE_TIMEOUT_SECS};

/// Environment variable overriding the gateway metrics endpoint
pub const ENV_METRICS_URL: &str = "METRICS_URL";

/// Environment variable overriding the results directory
pub const ENV_RESULTS_DIR: &str = "RESULTS_DIR";

/// Default results directory, relative to the working directory
pub const DEFAULT_RESULTS_DIR: &str = "results";

/// Settings for scraping metrics and writing reports
#[derive(Debug, Clone, PartialEq)]
pub struct ReportConfig {
    /// Prometheus endpoint exposed by the gateway
    pub metrics_url: String,
    /// HTTP timeout for a single scrape
    pub scrape_timeout: Duration,
    /// Directory holding `*_metrics.txt` and `*_status.txt` files
    pub results_dir: PathBuf,
    /// Where reports are written; defaults to `results_dir`
    pub output_dir: Option<PathBuf>,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            metrics_url: DEFAULT_METRICS_URL.to_string(),
            scrape_timeout: Duration::from_secs(DEFAULT_SCRAPE_TIMEOUT_SECS),
            results_dir: PathBuf::from(DEFAULT_RESULTS_DIR),
            output_dir: None,
        }
    }
}

impl ReportConfig {
    /// Load configuration from the environment
    pub fn load() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from an arbitrary key lookup (the environment in production)
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        Self {
            metrics_url: lookup(ENV_METRICS_URL)
                .filter(|v| !v.trim().is_empty())
                .unwrap_or(defaults.metrics_url),
            results_dir: lookup(ENV_RESULTS_DIR)
                .filter(|v| !v.trim().is_empty())
                .map(PathBuf::from)
                .unwrap_or(defaults.results_dir),
            ..defaults
        }
    }

    /// Directory reports are written to
    pub fn output_dir(&self) -> &PathBuf {
        self.output_dir.as_ref().unwrap_or(&self.results_dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ReportConfig::from_lookup(|_| None);
        assert_eq!(config.metrics_url, "http://localhost:9190/metrics");
        assert_eq!(config.scrape_timeout, Duration::from_secs(10));
        assert_eq!(config.output_dir(), &PathBuf::from("results"));
    }

    #[test]
    fn test_env_overrides() {
        let config = ReportConfig::from_lookup(|key| match key {
            ENV_METRICS_URL => Some("http://gateway:9190/metrics".to_string()),
            ENV_RESULTS_DIR => Some("/tmp/run-1".to_string()),
            _ => None,
        });
        assert_eq!(config.metrics_url, "http://gateway:9190/metrics");
        assert_eq!(config.results_dir, PathBuf::from("/tmp/run-1"));
    }

    #[test]
    fn test_blank_env_ignored() {
        let config = ReportConfig::from_lookup(|_| Some("  ".to_string()));
        assert_eq!(config, ReportConfig::default());
    }

    #[test]
    fn test_output_dir_override() {
        let config = ReportConfig {
            output_dir: Some(PathBuf::from("/reports")),
            ..ReportConfig::default()
        };
        assert_eq!(config.output_dir(), &PathBuf::from("/reports"));
    }
}
