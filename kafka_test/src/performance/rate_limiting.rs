//! Paced batch production
//!
//! Five batches of twenty records, flushed after each batch with a one second
//! pause in between. Checks that flushes stay bounded and every record lands.

use std::time::{Duration, Instant};

use rdkafka::producer::{FutureRecord, Producer};
use tracing::{info, warn};

use crate::common::{create_batching_producer, timestamp_millis, TestResult, BATCH_TIMEOUT, TEST_TIMEOUT};
use crate::config::SuiteConfig;
use crate::setup::TestContext;
use crate::{ensure, ensure_eq};

const BATCH_COUNT: usize = 5;
const MESSAGES_PER_BATCH: usize = 20;
const BATCH_PAUSE: Duration = Duration::from_secs(1);

pub async fn test_rate_limiting(config: &SuiteConfig) -> TestResult {
    info!("=== Test: Rate Limiting ===");

    let ctx = TestContext::new(config)?;
    let topic = ctx.timestamped_topic("rate-limit-topic").await;
    let producer = create_batching_producer(config)?;
    let total = BATCH_COUNT * MESSAGES_PER_BATCH;

    info!(
        "Sending {} batches of {} messages with controlled timing",
        BATCH_COUNT, MESSAGES_PER_BATCH
    );
    let total_start = Instant::now();
    let mut pending = Vec::with_capacity(total);
    let mut batch_durations = Vec::with_capacity(BATCH_COUNT);

    for batch in 0..BATCH_COUNT {
        let batch_start = Instant::now();

        for i in 0..MESSAGES_PER_BATCH {
            let key = format!("batch-{}-key-{}", batch, i);
            let value = format!(
                "rate-limit-message-batch-{}-msg-{}-{}",
                batch,
                i,
                timestamp_millis()
            );
            let delivery = producer
                .send_result(FutureRecord::to(&topic).key(&key).payload(&value))
                .map_err(|(err, _record)| err)?;
            pending.push(delivery);
        }
        producer.flush(BATCH_TIMEOUT)?;

        let batch_duration = batch_start.elapsed();
        ensure!(
            batch_duration < BATCH_TIMEOUT,
            "Batch {} took {:?}",
            batch + 1,
            batch_duration
        );
        info!("   Batch {} sent in {}ms", batch + 1, batch_duration.as_millis());
        batch_durations.push(batch_duration);

        if batch + 1 < BATCH_COUNT {
            tokio::time::sleep(BATCH_PAUSE).await;
        }
    }

    let mut success = 0usize;
    for delivery in pending {
        match tokio::time::timeout(TEST_TIMEOUT, delivery).await {
            Ok(Ok(Ok(_))) => success += 1,
            Ok(Ok(Err((e, _msg)))) => warn!(error = %e, "Message send failed"),
            Ok(Err(_canceled)) => warn!("Delivery future canceled"),
            Err(_) => warn!("Delivery report timed out"),
        }
    }
    let total_duration = total_start.elapsed();

    ensure_eq!(batch_durations.len(), BATCH_COUNT, "Missing batch timings");
    let min_duration = BATCH_PAUSE * (BATCH_COUNT as u32 - 1);
    ensure!(
        total_duration >= min_duration,
        "Total duration {:?} shorter than the pauses alone",
        total_duration
    );
    ensure_eq!(success, total, "Not every message was delivered");

    let throughput = total as f64 / total_duration.as_secs_f64();
    ensure!(throughput > 0.0, "Throughput is {}", throughput);

    info!("✅ Rate limiting test completed");
    info!("   Delivered: {}/{}", success, total);
    info!("   Duration: {}ms", total_duration.as_millis());
    info!("   Throughput: {:.2} msgs/sec", throughput);

    ctx.cleanup().await?;
    Ok(())
}
