//! Seek to beginning, end and an explicit offset on partition 0

use std::time::Duration;

use rdkafka::consumer::{BaseConsumer, Consumer};
use rdkafka::{Offset, TopicPartitionList};
use tracing::info;

use crate::common::{create_base_consumer, TestResult, CONSUME_TIMEOUT, TEST_TIMEOUT};
use crate::config::SuiteConfig;
use crate::fixtures::{poll_records, ConsumedRecord, TestTopic};
use crate::setup::TestContext;
use crate::{ensure, ensure_eq};

const PARTITION: i32 = 0;

/// Nothing should arrive after seeking to the end of a quiet partition
const END_PROBE: Duration = Duration::from_secs(2);

fn first_after_seek(
    consumer: &BaseConsumer,
    topic: &str,
    offset: Offset,
) -> TestResult<Option<ConsumedRecord>> {
    consumer.seek(topic, PARTITION, offset, TEST_TIMEOUT)?;
    Ok(poll_records(consumer, 1, CONSUME_TIMEOUT).into_iter().next())
}

pub async fn test_seek_operations(
    config: &SuiteConfig,
    ctx: &TestContext,
    topic: &TestTopic,
) -> TestResult {
    let group = ctx.unique_group("seek-test-group");
    let consumer = create_base_consumer(config, &group)?;

    let mut tpl = TopicPartitionList::new();
    tpl.add_partition_offset(&topic.name, PARTITION, Offset::Beginning)?;
    consumer.assign(&tpl)?;

    // Seeking needs an active fetcher, so consume once first
    let warmup = poll_records(&consumer, 1, CONSUME_TIMEOUT);
    ensure!(!warmup.is_empty(), "Partition {} returned no record", PARTITION);

    let (low, high) = consumer.fetch_watermarks(&topic.name, PARTITION, TEST_TIMEOUT)?;
    ensure!(low >= 0, "Negative low watermark {}", low);
    ensure!(high >= low, "High watermark {} below low watermark {}", high, low);

    let beginning = first_after_seek(&consumer, &topic.name, Offset::Beginning)?
        .ok_or("No record after seek to beginning")?;
    ensure_eq!(beginning.offset, low, "First offset after seek to beginning");
    info!("   ✅ Seek to beginning: offset {}", beginning.offset);

    consumer.seek(&topic.name, PARTITION, Offset::End, TEST_TIMEOUT)?;
    let after_end = poll_records(&consumer, 1, END_PROBE);
    ensure!(
        after_end.is_empty(),
        "Got offset {:?} after seek to end",
        after_end.first().map(|r| r.offset)
    );
    info!("   ✅ Seek to end: offset {}", high);

    let middle = low + (high - low) / 2;
    let record = first_after_seek(&consumer, &topic.name, Offset::Offset(middle))?
        .ok_or("No record after seek to explicit offset")?;
    ensure_eq!(record.offset, middle, "First offset after explicit seek");
    info!("   ✅ Seek to specific offset: {}", record.offset);

    Ok(())
}
