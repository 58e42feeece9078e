//! Basic produce/consume round trip
//!
//! The topic is not pre-created: the first produce relies on broker-side
//! auto-creation, which is part of what the round trip checks.

use rdkafka::consumer::Consumer;
use rdkafka::producer::FutureRecord;
use tracing::info;

use crate::assertions::assert_valid_delivery;
use crate::common::{
    create_producer, create_stream_consumer, timestamp_millis, TestResult, CONSUME_TIMEOUT,
    TEST_TIMEOUT,
};
use crate::config::SuiteConfig;
use crate::fixtures::consume_stream;
use crate::setup::TestContext;
use crate::{ensure, ensure_eq};

const KEY: &str = "test-key";

/// Produce one keyed record and read it back from the earliest offset
///
/// 1. Sends `test-key` / `basic-message-<ts>` with acks=all
/// 2. Checks the delivery report (partition and offset >= 0)
/// 3. Consumes for up to 15s and compares key and value
pub async fn test_basic_produce_consume(config: &SuiteConfig) -> TestResult {
    info!("=== Test: Basic Produce/Consume ===");

    let ctx = TestContext::new(config)?;
    let topic = ctx.timestamped_topic("basic-test-topic").await;
    let value = format!("basic-message-{}", timestamp_millis());

    info!("Step 1: Producing to '{}'", topic);
    let producer = create_producer(config)?;
    let (partition, offset) = producer
        .send(FutureRecord::to(&topic).key(KEY).payload(&value), TEST_TIMEOUT)
        .await
        .map_err(|(err, _msg)| err)?;
    assert_valid_delivery(partition, offset)?;
    info!("✅ Delivered: partition={}, offset={}", partition, offset);

    info!("Step 2: Consuming from earliest");
    let group = ctx.unique_group("basic-test-group");
    let consumer = create_stream_consumer(config, &group)?;
    consumer.subscribe(&[&topic])?;

    let records = consume_stream(&consumer, 1, CONSUME_TIMEOUT).await;
    let record = match records.first() {
        Some(record) => record,
        None => {
            return Err(format!(
                "No record consumed from '{}' within {:?}",
                topic, CONSUME_TIMEOUT
            )
            .into())
        }
    };

    ensure_eq!(record.key.as_deref(), Some(KEY), "Consumed key mismatch");
    ensure_eq!(record.value_str(), Some(value.as_str()), "Consumed value mismatch");
    ensure!(record.offset >= 0, "Consumed negative offset {}", record.offset);
    info!(
        "✅ Consumed: key={}, partition={}, offset={}",
        KEY, record.partition, record.offset
    );

    ctx.cleanup().await?;
    info!("✅ Basic produce/consume test PASSED");
    Ok(())
}
