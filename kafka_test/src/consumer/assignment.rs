//! Partition assignment strategies

use rdkafka::consumer::Consumer;
use tracing::{info, warn};

use super::wait_for_assignment;
use crate::common::{create_strategy_consumer, TestResult, CONSUME_TIMEOUT};
use crate::compat::{AssignmentStrategy, ClientLibraryVersion};
use crate::config::SuiteConfig;
use crate::ensure_eq;
use crate::fixtures::TestTopic;
use crate::setup::TestContext;

/// Sole member of a fresh group must own every partition
async fn check_strategy(
    config: &SuiteConfig,
    ctx: &TestContext,
    topic: &TestTopic,
    strategy: AssignmentStrategy,
) -> TestResult {
    let group = ctx.unique_group(&format!("{}-group", strategy.config_value()));
    let consumer = create_strategy_consumer(config, &group, strategy.config_value())?;
    consumer.subscribe(&[&topic.name])?;

    let (assignment, _records) = wait_for_assignment(&consumer, CONSUME_TIMEOUT)?;
    let mut partitions: Vec<i32> = assignment.elements().iter().map(|e| e.partition()).collect();
    partitions.sort_unstable();
    info!(
        "     ✅ {} strategy assigned {} partitions: {:?}",
        strategy,
        partitions.len(),
        partitions
    );
    ensure_eq!(
        partitions,
        (0..topic.partitions).collect::<Vec<_>>(),
        "{} assignment",
        strategy
    );
    Ok(())
}

pub async fn test_assignment_strategies(
    config: &SuiteConfig,
    ctx: &TestContext,
    topic: &TestTopic,
) -> TestResult {
    let library = ClientLibraryVersion::detect();

    for strategy in AssignmentStrategy::ALL {
        info!("   Testing {} assignment strategy", strategy);
        if !strategy.is_supported_by(&library) {
            info!("   {} not available in {}, skipping", strategy, library);
            continue;
        }

        match check_strategy(config, ctx, topic, strategy).await {
            Ok(()) => {}
            Err(e) if strategy.is_optional() => {
                warn!("   {} assignment not available: {}", strategy, e)
            }
            Err(e) => return Err(e),
        }
    }
    Ok(())
}
