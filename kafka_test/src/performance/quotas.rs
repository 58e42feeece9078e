//! Quota handling under a burst of small requests

use std::time::Instant;

use futures::future::join_all;
use rdkafka::producer::FutureRecord;
use tracing::{info, warn};

use crate::common::{create_unbatched_producer, timestamp_millis, TestResult, BATCH_TIMEOUT};
use crate::config::SuiteConfig;
use crate::setup::TestContext;
use crate::{ensure, ensure_eq};

const MESSAGE_COUNT: usize = 100;

/// Whether a delivery error looks like broker-side quota enforcement
pub fn is_throttle_error(message: &str) -> bool {
    let message = message.to_ascii_lowercase();
    message.contains("quota") || message.contains("throttle")
}

/// Send 100 records concurrently, one per request
///
/// Each delivery either succeeds or is throttled; any other error fails the
/// scenario. At least one record must get through.
pub async fn test_quotas(config: &SuiteConfig) -> TestResult {
    info!("=== Test: Quota Handling ===");

    let ctx = TestContext::new(config)?;
    let topic = ctx.timestamped_topic("quota-test-topic").await;
    let producer = create_unbatched_producer(config)?;

    let payloads: Vec<(String, String)> = (0..MESSAGE_COUNT)
        .map(|i| {
            (
                format!("quota-key-{}", i),
                format!("quota-message-{}-{}", i, timestamp_millis()),
            )
        })
        .collect();

    info!("Sending {} messages rapidly", MESSAGE_COUNT);
    let start = Instant::now();
    let deliveries = join_all(payloads.iter().map(|(key, value)| {
        producer.send(FutureRecord::to(&topic).key(key).payload(value), BATCH_TIMEOUT)
    }))
    .await;
    let elapsed = start.elapsed();

    let mut success = 0usize;
    let mut throttled = 0usize;
    for delivery in deliveries {
        match delivery {
            Ok(_) => success += 1,
            Err((e, _msg)) if is_throttle_error(&e.to_string()) => {
                warn!(error = %e, "Throttled delivery");
                throttled += 1;
            }
            Err((e, _msg)) => return Err(e.into()),
        }
    }

    ensure_eq!(success + throttled, MESSAGE_COUNT, "Unaccounted deliveries");
    ensure!(success > 0, "No message was delivered");

    let throughput = MESSAGE_COUNT as f64 / elapsed.as_secs_f64().max(f64::EPSILON);
    info!("✅ Quota test completed");
    info!("   Delivered: {}", success);
    info!("   Throttled: {}", throttled);
    info!("   Duration: {}ms", elapsed.as_millis());
    info!("   Throughput: {:.2} msgs/sec", throughput);

    ctx.cleanup().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_throttle_classification() {
        assert!(is_throttle_error("Broker: Throttled by quota"));
        assert!(is_throttle_error("request throttle time exceeded"));
        assert!(is_throttle_error("QUOTA violated"));
        assert!(!is_throttle_error("Message timed out"));
        assert!(!is_throttle_error("Broker: Unknown topic or partition"));
    }
}
