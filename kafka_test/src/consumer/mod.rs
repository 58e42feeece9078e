//! Consumer operation scenarios
//!
//! All sub-scenarios share one 3-partition topic holding 15 records
//! (`key-i` / `test-message-i` on partition `i % 3`):
//!
//! - `offsets`: explicit offset commit and committed-offset fetch
//! - `commit_modes`: auto-commit versus manual sync commit
//! - `seek`: seek to beginning, end and an explicit offset
//! - `assignment`: range, roundrobin and cooperative-sticky assignors
//! - `pause_resume`: no delivery while paused, delivery after resume
//! - `lag`: position against watermarks

mod assignment;
mod commit_modes;
mod lag;
mod offsets;
mod pause_resume;
mod seek;

use std::time::{Duration, Instant};

use rdkafka::consumer::{BaseConsumer, Consumer, ConsumerContext};
use rdkafka::producer::FutureProducer;
use rdkafka::TopicPartitionList;
use tracing::{info, warn};

use crate::common::{create_producer, TestResult, POLL_TIMEOUT};
use crate::config::SuiteConfig;
use crate::fixtures::{produce_messages, ConsumedRecord, TestMessage, TestTopic};
use crate::setup::TestContext;

pub use assignment::test_assignment_strategies;
pub use commit_modes::test_commit_modes;
pub use lag::test_consumer_lag;
pub use offsets::test_manual_offset_commit;
pub use pause_resume::test_pause_resume;
pub use seek::test_seek_operations;

pub const PARTITIONS: i32 = 3;
pub const RECORD_COUNT: usize = 15;

const TOPIC_SETTLE: Duration = Duration::from_secs(2);

/// `key-i` / `test-message-i` on partition `i % 3`
pub fn seed_messages() -> Vec<TestMessage> {
    (0..RECORD_COUNT)
        .map(|i| {
            TestMessage::with_key(format!("test-message-{}", i), format!("key-{}", i))
                .to_partition(i as i32 % PARTITIONS)
        })
        .collect()
}

/// Poll until the group assigns at least one partition
///
/// Records delivered while waiting are returned alongside the assignment.
pub fn wait_for_assignment<C: ConsumerContext>(
    consumer: &BaseConsumer<C>,
    timeout: Duration,
) -> TestResult<(TopicPartitionList, Vec<ConsumedRecord>)> {
    let start = Instant::now();
    let mut records = Vec::new();

    loop {
        match consumer.poll(POLL_TIMEOUT) {
            Some(Ok(msg)) => records.push(ConsumedRecord::from_message(&msg)),
            Some(Err(e)) => warn!(error = %e, "Consumer error while joining"),
            None => {}
        }

        let assignment = consumer.assignment()?;
        if assignment.count() > 0 || start.elapsed() >= timeout {
            return Ok((assignment, records));
        }
    }
}

/// Seed the shared topic and run every consumer sub-scenario in order
pub async fn test_consumer_operations(config: &SuiteConfig) -> TestResult {
    info!("=== Test: Consumer Operations ===");

    let ctx = TestContext::new(config)?;
    let name = ctx.timestamped_topic("consumer-ops-test").await;
    ctx.create_topic(&name, PARTITIONS).await?;
    tokio::time::sleep(TOPIC_SETTLE).await;
    let topic = TestTopic {
        name,
        partitions: PARTITIONS,
    };

    let producer = create_producer(config)?;
    topic.produce(&producer, &seed_messages()).await?;
    info!("Produced {} messages across {} partitions", RECORD_COUNT, PARTITIONS);

    info!("Step 1: Manual offset management");
    test_manual_offset_commit(config, &ctx, &topic).await?;

    info!("Step 2: Auto-commit vs manual commit");
    test_commit_modes(config, &ctx, &topic).await?;

    info!("Step 3: Seek operations");
    test_seek_operations(config, &ctx, &topic).await?;

    info!("Step 4: Partition assignment strategies");
    test_assignment_strategies(config, &ctx, &topic).await?;

    info!("Step 5: Pause/resume consumption");
    test_pause_resume(config, &ctx, &topic, &producer).await?;

    info!("Step 6: Consumer lag monitoring");
    test_consumer_lag(config, &ctx, &topic).await?;

    ctx.cleanup().await?;
    info!("✅ Consumer operations test PASSED");
    Ok(())
}

/// Produce one more record per partition, used after a pause
pub(crate) async fn produce_round(
    producer: &FutureProducer,
    topic: &TestTopic,
    tag: &str,
) -> TestResult<usize> {
    let messages: Vec<TestMessage> = (0..topic.partitions)
        .map(|p| {
            TestMessage::with_key(format!("{}-{}", tag, p), format!("{}-key-{}", tag, p))
                .to_partition(p)
        })
        .collect();
    let deliveries = produce_messages(producer, &topic.name, &messages).await?;
    Ok(deliveries.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seed_messages_layout() {
        let messages = seed_messages();
        assert_eq!(messages.len(), RECORD_COUNT);
        assert_eq!(messages[4].key.as_deref(), Some("key-4"));
        assert_eq!(messages[4].value, "test-message-4");
        assert_eq!(messages[4].partition, Some(1));
        for p in 0..PARTITIONS {
            let count = messages.iter().filter(|m| m.partition == Some(p)).count();
            assert_eq!(count, RECORD_COUNT / PARTITIONS as usize);
        }
    }
}
