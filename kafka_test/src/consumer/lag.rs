//! Consumer lag against partition watermarks

use rdkafka::consumer::Consumer;
use rdkafka::Offset;
use tracing::info;

use super::wait_for_assignment;
use crate::common::{create_base_consumer, TestResult, CONSUME_TIMEOUT, TEST_TIMEOUT};
use crate::config::SuiteConfig;
use crate::ensure;
use crate::fixtures::TestTopic;
use crate::setup::TestContext;

/// Effective position: a partition that has not fetched yet sits at `low`
pub fn effective_position(position: Offset, low: i64) -> i64 {
    match position {
        Offset::Offset(n) => n,
        _ => low,
    }
}

pub async fn test_consumer_lag(
    config: &SuiteConfig,
    ctx: &TestContext,
    topic: &TestTopic,
) -> TestResult {
    let group = ctx.unique_group("lag-monitoring-group");
    let consumer = create_base_consumer(config, &group)?;
    consumer.subscribe(&[&topic.name])?;

    let (assignment, records) = wait_for_assignment(&consumer, CONSUME_TIMEOUT)?;
    ensure!(assignment.count() > 0, "No partition assignment for lag monitoring");

    let positions = consumer.position()?;
    let mut total_lag = 0;
    for elem in positions.elements() {
        let (low, high) =
            consumer.fetch_watermarks(elem.topic(), elem.partition(), TEST_TIMEOUT)?;
        let position = effective_position(elem.offset(), low);
        let lag = high - position;

        ensure!(
            position >= low,
            "Partition {} position {} below low watermark {}",
            elem.partition(),
            position,
            low
        );
        ensure!(
            lag >= 0,
            "Partition {} position {} beyond end {}",
            elem.partition(),
            position,
            high
        );
        info!(
            "   Partition {}: position={}, end={}, lag={}",
            elem.partition(),
            position,
            high,
            lag
        );
        total_lag += lag;
    }

    info!(
        "   ✅ Total consumer lag: {} messages ({} consumed while joining)",
        total_lag,
        records.len()
    );
    Ok(())
}
