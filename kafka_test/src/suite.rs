//! Scenario selection, execution and result tracking

use std::fmt;
use std::future::Future;
use std::time::{Duration, Instant};

use clap::ValueEnum;
use serde::Serialize;
use tracing::{error, info, warn};

use crate::assertions::skip_reason;
use crate::common::TestResult;
use crate::config::SuiteConfig;
use crate::{
    admin, consumer, consumer_group, idempotent, metadata, performance, producer, streams,
    transaction,
};

/// Pause between the scenarios of the `compatibility` group
const COMPATIBILITY_PAUSE: Duration = Duration::from_secs(1);

/// Scenario (or scenario group) selected on the command line
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum TestType {
    Basic,
    Api,
    Topics,
    ConsumerGroups,
    Cluster,
    Idempotent,
    Eos,
    Streams,
    Serializers,
    Quotas,
    RateLimiting,
    Admin,
    Consumer,
    Compatibility,
    All,
}

impl TestType {
    /// Order used by `all`
    pub const ALL_ORDER: [TestType; 14] = [
        TestType::Compatibility,
        TestType::Basic,
        TestType::Admin,
        TestType::Idempotent,
        TestType::Eos,
        TestType::Streams,
        TestType::Serializers,
        TestType::Quotas,
        TestType::RateLimiting,
        TestType::Api,
        TestType::Topics,
        TestType::ConsumerGroups,
        TestType::Cluster,
        TestType::Consumer,
    ];

    /// Scenarios making up the `compatibility` group
    pub const COMPATIBILITY_ORDER: [TestType; 5] = [
        TestType::Api,
        TestType::Topics,
        TestType::Basic,
        TestType::ConsumerGroups,
        TestType::Cluster,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            TestType::Basic => "basic",
            TestType::Api => "api",
            TestType::Topics => "topics",
            TestType::ConsumerGroups => "consumer-groups",
            TestType::Cluster => "cluster",
            TestType::Idempotent => "idempotent",
            TestType::Eos => "eos",
            TestType::Streams => "streams",
            TestType::Serializers => "serializers",
            TestType::Quotas => "quotas",
            TestType::RateLimiting => "rate-limiting",
            TestType::Admin => "admin",
            TestType::Consumer => "consumer",
            TestType::Compatibility => "compatibility",
            TestType::All => "all",
        }
    }

    pub fn category(&self) -> &'static str {
        match self {
            TestType::Basic | TestType::Serializers => "Producer",
            TestType::Api | TestType::Cluster => "Metadata",
            TestType::Topics | TestType::Admin => "Admin",
            TestType::ConsumerGroups => "Consumer Group",
            TestType::Consumer => "Consumer",
            TestType::Idempotent => "Idempotent",
            TestType::Eos => "Transaction",
            TestType::Streams => "Streams",
            TestType::Quotas | TestType::RateLimiting => "Performance",
            TestType::Compatibility | TestType::All => "Suite",
        }
    }

    /// True for the variants that only group other scenarios
    pub fn is_group(&self) -> bool {
        matches!(self, TestType::Compatibility | TestType::All)
    }
}

impl fmt::Display for TestType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Outcome {
    Passed,
    Failed,
    Skipped,
}

impl Outcome {
    fn label(&self) -> &'static str {
        match self {
            Outcome::Passed => "✅ PASSED",
            Outcome::Failed => "❌ FAILED",
            Outcome::Skipped => "⏭️  SKIPPED",
        }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct ScenarioResult {
    pub category: &'static str,
    pub name: &'static str,
    pub outcome: Outcome,
    pub duration_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Test suite result tracking
#[derive(Debug, Default, Serialize)]
pub struct TestSuiteResults {
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
    pub results: Vec<ScenarioResult>,
}

impl TestSuiteResults {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, scenario: TestType, result: TestResult, elapsed: Duration) {
        let (outcome, message) = match &result {
            Ok(()) => (Outcome::Passed, None),
            Err(e) => match skip_reason(e) {
                Some(reason) => (Outcome::Skipped, Some(reason.to_string())),
                None => (Outcome::Failed, Some(e.to_string())),
            },
        };

        match outcome {
            Outcome::Passed => self.passed += 1,
            Outcome::Failed => self.failed += 1,
            Outcome::Skipped => self.skipped += 1,
        }

        self.results.push(ScenarioResult {
            category: scenario.category(),
            name: scenario.name(),
            outcome,
            duration_ms: elapsed.as_millis() as u64,
            message,
        });
    }

    pub fn total(&self) -> usize {
        self.passed + self.failed + self.skipped
    }

    pub fn all_passed(&self) -> bool {
        self.failed == 0
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn print_summary(&self) {
        println!("\n{}", "=".repeat(60));
        println!("TEST SUITE SUMMARY");
        println!("{}\n", "=".repeat(60));

        let mut current_category = "";
        for result in &self.results {
            if result.category != current_category {
                if !current_category.is_empty() {
                    println!();
                }
                println!("{}:", result.category);
                current_category = result.category;
            }
            println!(
                "  {} - {} ({} ms)",
                result.name,
                result.outcome.label(),
                result.duration_ms
            );
            if let (Outcome::Skipped, Some(reason)) = (result.outcome, &result.message) {
                println!("      {}", reason);
            }
        }

        println!("\n{}", "-".repeat(60));
        println!(
            "Total: {} passed, {} failed, {} skipped, {} total",
            self.passed,
            self.failed,
            self.skipped,
            self.total()
        );

        if self.all_passed() {
            println!("\n✅ ALL TESTS PASSED");
        } else {
            println!("\n❌ SOME TESTS FAILED");
        }
    }
}

async fn timed<F>(results: &mut TestSuiteResults, scenario: TestType, fut: F)
where
    F: Future<Output = TestResult>,
{
    info!("▶ Running {}", scenario);
    let start = Instant::now();
    let result = fut.await;
    let elapsed = start.elapsed();

    match &result {
        Ok(()) => info!("✅ {} passed in {:?}", scenario, elapsed),
        Err(e) => match skip_reason(e) {
            Some(reason) => warn!("⏭️  {} skipped: {}", scenario, reason),
            None => error!("❌ {} failed: {}", scenario, e),
        },
    }
    results.record(scenario, result, elapsed);
}

/// Run one leaf scenario and record its outcome
pub async fn run_scenario(config: &SuiteConfig, scenario: TestType, results: &mut TestSuiteResults) {
    match scenario {
        TestType::Basic => {
            timed(results, scenario, producer::test_basic_produce_consume(config)).await
        }
        TestType::Api => timed(results, scenario, metadata::test_api_versions(config)).await,
        TestType::Topics => timed(results, scenario, admin::test_topic_lifecycle(config)).await,
        TestType::ConsumerGroups => {
            timed(results, scenario, consumer_group::test_consumer_groups(config)).await
        }
        TestType::Cluster => {
            timed(results, scenario, metadata::test_cluster_metadata(config)).await
        }
        TestType::Idempotent => {
            timed(results, scenario, idempotent::test_idempotent_producer(config)).await
        }
        TestType::Eos => timed(results, scenario, transaction::test_exactly_once(config)).await,
        TestType::Streams => timed(results, scenario, streams::test_streams(config)).await,
        TestType::Serializers => {
            timed(results, scenario, producer::test_serializers(config)).await
        }
        TestType::Quotas => timed(results, scenario, performance::test_quotas(config)).await,
        TestType::RateLimiting => {
            timed(results, scenario, performance::test_rate_limiting(config)).await
        }
        TestType::Admin => timed(results, scenario, admin::test_admin_operations(config)).await,
        TestType::Consumer => {
            timed(results, scenario, consumer::test_consumer_operations(config)).await
        }
        TestType::Compatibility | TestType::All => {
            warn!("{} is a scenario group, use run()", scenario)
        }
    }
}

async fn run_compatibility(config: &SuiteConfig, results: &mut TestSuiteResults) {
    info!("=== Compatibility scenarios ===");
    for (i, scenario) in TestType::COMPATIBILITY_ORDER.into_iter().enumerate() {
        if i > 0 {
            tokio::time::sleep(COMPATIBILITY_PAUSE).await;
        }
        run_scenario(config, scenario, results).await;
    }
}

/// Run the selected scenario or scenario group
pub async fn run(config: &SuiteConfig, selection: TestType) -> TestSuiteResults {
    let mut results = TestSuiteResults::new();

    match selection {
        TestType::All => {
            for scenario in TestType::ALL_ORDER {
                if scenario == TestType::Compatibility {
                    run_compatibility(config, &mut results).await;
                } else {
                    run_scenario(config, scenario, &mut results).await;
                }
            }
        }
        TestType::Compatibility => run_compatibility(config, &mut results).await,
        leaf => run_scenario(config, leaf, &mut results).await,
    }

    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assertions::skip;
    use crate::common::TestError;

    #[test]
    fn test_value_names_match_cli() {
        for test_type in TestType::value_variants() {
            let parsed = TestType::from_str(test_type.name(), false).unwrap();
            assert_eq!(&parsed, test_type);
        }
        assert_eq!(
            TestType::from_str("rate-limiting", false).unwrap(),
            TestType::RateLimiting
        );
    }

    #[test]
    fn test_all_order() {
        assert_eq!(TestType::ALL_ORDER[0], TestType::Compatibility);
        assert_eq!(TestType::ALL_ORDER[13], TestType::Consumer);
        assert!(!TestType::ALL_ORDER.contains(&TestType::All));
        // Every leaf scenario runs exactly once outside the compatibility group
        let leaves = TestType::value_variants()
            .iter()
            .filter(|t| !t.is_group())
            .count();
        assert_eq!(TestType::ALL_ORDER.len(), leaves + 1);
    }

    #[test]
    fn test_record_outcomes() {
        let mut results = TestSuiteResults::new();
        results.record(TestType::Basic, Ok(()), Duration::from_millis(5));
        results.record(
            TestType::Streams,
            Err(skip("no broker support")),
            Duration::ZERO,
        );
        let failure: TestError = "boom".into();
        results.record(TestType::Eos, Err(failure), Duration::ZERO);

        assert_eq!((results.passed, results.failed, results.skipped), (1, 1, 1));
        assert!(!results.all_passed());
        assert_eq!(results.results[1].message.as_deref(), Some("no broker support"));
        assert_eq!(results.results[2].category, "Transaction");
    }

    #[test]
    fn test_json_document() {
        let mut results = TestSuiteResults::new();
        results.record(TestType::Api, Ok(()), Duration::from_millis(12));

        let value: serde_json::Value = serde_json::from_str(&results.to_json().unwrap()).unwrap();
        assert_eq!(value["passed"], 1);
        assert_eq!(value["results"][0]["name"], "api");
        assert_eq!(value["results"][0]["outcome"], "PASSED");
        assert!(value["results"][0].get("message").is_none());
    }
}
