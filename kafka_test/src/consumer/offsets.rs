//! Explicit offset commit

use std::collections::BTreeMap;

use rdkafka::consumer::{CommitMode, Consumer};
use rdkafka::{Offset, TopicPartitionList};
use tracing::info;

use crate::common::{create_base_consumer, TestResult, CONSUME_TIMEOUT, TEST_TIMEOUT};
use crate::config::SuiteConfig;
use crate::fixtures::{poll_records, ConsumedRecord, TestTopic};
use crate::setup::TestContext;
use crate::{ensure, ensure_eq};

const PROCESS_COUNT: usize = 3;

/// Next offset to commit per partition after processing `records` in order
pub fn offsets_to_commit(records: &[ConsumedRecord]) -> BTreeMap<i32, i64> {
    let mut offsets = BTreeMap::new();
    for record in records {
        let next = offsets.entry(record.partition).or_insert(record.offset + 1);
        *next = (*next).max(record.offset + 1);
    }
    offsets
}

/// Commit offset+1 of the first three records, then read the commits back
pub async fn test_manual_offset_commit(
    config: &SuiteConfig,
    ctx: &TestContext,
    topic: &TestTopic,
) -> TestResult {
    let group = ctx.unique_group("manual-offset-group");
    let consumer = create_base_consumer(config, &group)?;
    consumer.subscribe(&[&topic.name])?;

    let records = poll_records(&consumer, PROCESS_COUNT, CONSUME_TIMEOUT);
    ensure!(
        records.len() >= PROCESS_COUNT,
        "Received {} records, need {}",
        records.len(),
        PROCESS_COUNT
    );

    let expected = offsets_to_commit(&records[..PROCESS_COUNT]);
    let mut tpl = TopicPartitionList::new();
    for (&partition, &offset) in &expected {
        tpl.add_partition_offset(&topic.name, partition, Offset::Offset(offset))?;
    }
    consumer.commit(&tpl, CommitMode::Sync)?;
    info!(
        "   Committed offsets for {} partition(s) after {} records",
        expected.len(),
        PROCESS_COUNT
    );

    let mut query = TopicPartitionList::new();
    for &partition in expected.keys() {
        query.add_partition(&topic.name, partition);
    }
    let committed = consumer.committed_offsets(query, TEST_TIMEOUT)?;
    for elem in committed.elements() {
        let want = expected.get(&elem.partition()).copied();
        ensure_eq!(
            Some(elem.offset()),
            want.map(Offset::Offset),
            "Committed offset for partition {}",
            elem.partition()
        );
    }
    info!("   ✅ Committed offsets match expected values");
    Ok(())
}
