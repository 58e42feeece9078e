//! Exactly-once semantics
//!
//! Validates the transactional producer flow end to end:
//! InitProducerId, AddPartitionsToTxn, EndTxn(commit) and EndTxn(abort).

use std::time::Duration;

use rdkafka::consumer::Consumer;
use rdkafka::producer::{FutureProducer, FutureRecord, Producer};
use tracing::{info, warn};

use crate::common::{
    create_read_committed_consumer, create_transactional_producer, timestamp_millis, TestResult,
    CONSUME_TIMEOUT, TEST_TIMEOUT,
};
use crate::config::SuiteConfig;
use crate::fixtures::consume_stream;
use crate::setup::TestContext;
use crate::{ensure, ensure_eq};

const COMMITTED_COUNT: usize = 5;
const ABORTED_VALUE: &str = "this-message-should-be-aborted";

/// How long to keep reading after the committed batch, looking for aborted data
const ABORT_LEAK_WINDOW: Duration = Duration::from_secs(2);

/// Transactional commit, abort, and read_committed visibility
///
/// 1. init_transactions with id `eos-test-<ts>`
/// 2. Transaction 1: 5 records, committed
/// 3. Transaction 2: 1 record, aborted
/// 4. A read_committed consumer sees exactly the 5 committed values
pub async fn test_exactly_once(config: &SuiteConfig) -> TestResult {
    info!("=== Test: Exactly-Once Semantics ===");

    let ctx = TestContext::new(config)?;
    let topic = ctx.timestamped_topic("eos-test-topic").await;
    ctx.create_topic(&topic, 1).await?;
    let transactional_id = format!("eos-test-{}", timestamp_millis());

    info!("Step 1: Initializing transactions (id={})", transactional_id);
    let producer = create_transactional_producer(config, &transactional_id)?;
    producer.init_transactions(TEST_TIMEOUT)?;
    info!("✅ Transactions initialized");

    info!("Step 2: Committed transaction with {} records", COMMITTED_COUNT);
    producer.begin_transaction()?;
    if let Err(e) = send_committed_batch(&producer, &topic).await {
        warn!(error = %e, "Send failed inside transaction, aborting");
        producer.abort_transaction(TEST_TIMEOUT)?;
        return Err(e);
    }
    producer.commit_transaction(TEST_TIMEOUT)?;
    info!("✅ Transaction committed");

    info!("Step 3: Aborted transaction");
    producer.begin_transaction()?;
    let aborted = producer
        .send(
            FutureRecord::to(&topic).key("abort-key").payload(ABORTED_VALUE),
            TEST_TIMEOUT,
        )
        .await;
    if let Err((e, _msg)) = aborted {
        warn!(error = %e, "Send failed inside transaction to be aborted");
    }
    producer.abort_transaction(TEST_TIMEOUT)?;
    info!("✅ Transaction aborted");

    info!("Step 4: Reading with isolation.level=read_committed");
    let group = ctx.unique_group("eos-verify-group");
    let consumer = create_read_committed_consumer(config, &group)?;
    consumer.subscribe(&[&topic])?;

    let mut records = consume_stream(&consumer, COMMITTED_COUNT, CONSUME_TIMEOUT).await;
    records.extend(consume_stream(&consumer, 1, ABORT_LEAK_WINDOW).await);

    let values: Vec<&str> = records.iter().filter_map(|r| r.value_str()).collect();
    ensure!(
        !values.contains(&ABORTED_VALUE),
        "Aborted record visible to read_committed consumer"
    );
    let expected: Vec<String> = (0..COMMITTED_COUNT)
        .map(|i| format!("eos-message-{}", i))
        .collect();
    ensure_eq!(values, expected, "Committed records mismatch");
    info!("✅ Exactly {} committed records visible", COMMITTED_COUNT);

    ctx.cleanup().await?;
    Ok(())
}

async fn send_committed_batch(producer: &FutureProducer, topic: &str) -> TestResult {
    for i in 0..COMMITTED_COUNT {
        let key = format!("eos-key-{}", i);
        let value = format!("eos-message-{}", i);
        producer
            .send(FutureRecord::to(topic).key(&key).payload(&value), TEST_TIMEOUT)
            .await
            .map_err(|(err, _msg)| err)?;
    }
    Ok(())
}
