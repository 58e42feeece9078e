//! Serializer compatibility
//!
//! Keys travel as strings while the value is handed to the client as raw
//! bytes, then decoded back on the consuming side.

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

const KEY: &str = "custom-key";

pub async fn test_serializers(config: &SuiteConfig) -> TestResult {
    info!("=== Test: Custom Serializers ===");

    let ctx = TestContext::new(config)?;
    let topic = ctx.timestamped_topic("custom-serializer-topic").await;
    let sent = format!("custom-serialized-message-{}", timestamp_millis());
    let bytes: Vec<u8> = sent.clone().into_bytes();
    ensure!(!bytes.is_empty(), "Serialized value is empty");

    let producer = create_producer(config)?;
    let (partition, offset) = producer
        .send(
            FutureRecord::to(&topic).key(KEY).payload(bytes.as_slice()),
            TEST_TIMEOUT,
        )
        .await
        .map_err(|(err, _msg)| err)?;
    assert_valid_delivery(partition, offset)?;
    info!(
        "✅ Sent {} bytes to partition={}, offset={}",
        bytes.len(),
        partition,
        offset
    );

    let group = ctx.unique_group("custom-serializer-group");
    let consumer = create_stream_consumer(config, &group)?;
    consumer.subscribe(&[&topic])?;

    let records = consume_stream(&consumer, 1, CONSUME_TIMEOUT).await;
    let record = match records.first() {
        Some(record) => record,
        None => return Err(format!("No record consumed from '{}'", topic).into()),
    };

    ensure_eq!(record.key.as_deref(), Some(KEY), "Consumed key mismatch");
    let received = record.value.as_deref().unwrap_or_default();
    ensure!(!received.is_empty(), "Consumed value has no bytes");
    ensure_eq!(
        String::from_utf8_lossy(received),
        sent.as_str(),
        "Decoded value does not match the sent value"
    );
    info!("✅ Decoded value matches ({} bytes)", received.len());

    ctx.cleanup().await?;
    Ok(())
}
