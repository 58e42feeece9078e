//! Idempotent producer delivery
//!
//! Sending the same key/value three times with enable.idempotence=true must
//! still yield three distinct records: idempotence only drops retries of a
//! single send, never separate sends.

use rdkafka::producer::FutureRecord;
use tracing::info;

use crate::assertions::{assert_offsets_increasing, assert_valid_delivery};
use crate::common::{create_idempotent_producer, timestamp_millis, TestResult, TEST_TIMEOUT};
use crate::config::SuiteConfig;
use crate::ensure_eq;
use crate::setup::TestContext;

const SEND_COUNT: usize = 3;
const KEY: &str = "idempotent-key";

pub async fn test_idempotent_producer(config: &SuiteConfig) -> TestResult {
    info!("=== Test: Idempotent Producer ===");

    let ctx = TestContext::new(config)?;
    let topic = ctx.timestamped_topic("idempotent-test-topic").await;
    let value = format!("idempotent-message-{}", timestamp_millis());

    let producer = create_idempotent_producer(config)?;
    info!("✅ Idempotent producer created (acks=all, max.in.flight=5)");

    let mut offsets = Vec::with_capacity(SEND_COUNT);
    for i in 1..=SEND_COUNT {
        let (partition, offset) = producer
            .send(FutureRecord::to(&topic).key(KEY).payload(&value), TEST_TIMEOUT)
            .await
            .map_err(|(err, _msg)| err)?;
        assert_valid_delivery(partition, offset)?;
        info!("Sent idempotent message {} to offset {}", i, offset);
        offsets.push(offset);
    }

    ensure_eq!(offsets.len(), SEND_COUNT, "Unexpected delivery count");
    assert_offsets_increasing(&offsets)?;
    info!("✅ Offsets strictly increasing: {:?}", offsets);

    ctx.cleanup().await?;
    Ok(())
}
