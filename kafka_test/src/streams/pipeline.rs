//! Streams compatibility scenario

use std::time::Duration;

use rdkafka::consumer::Consumer;
use rdkafka::producer::FutureRecord;
use tracing::info;

use super::app::StreamsApp;
use super::topology::uppercase_topology;
use crate::common::{
    create_producer, create_stream_consumer, timestamp_millis, TestResult, TEST_TIMEOUT,
};
use crate::config::SuiteConfig;
use crate::fixtures::consume_stream;
use crate::setup::TestContext;
use crate::{ensure, ensure_eq};

const COMMIT_INTERVAL: Duration = Duration::from_millis(1000);
const RUNNING_TIMEOUT: Duration = Duration::from_secs(30);
const OUTPUT_TIMEOUT: Duration = Duration::from_secs(10);
const CLOSE_TIMEOUT: Duration = Duration::from_secs(10);
const TOPIC_PROPAGATION: Duration = Duration::from_secs(1);

const INPUT_VALUE: &str = "stream-test-message";

/// Run the uppercase topology and check its output
///
/// 1. Pre-create input and output topics (1 partition each)
/// 2. Start the app and wait up to 30s for RUNNING
/// 3. Produce `stream-test-message` to the input
/// 4. Read `PROCESSED: STREAM-TEST-MESSAGE` from the output within 10s
pub async fn test_streams(config: &SuiteConfig) -> TestResult {
    info!("=== Test: Streams Compatibility ===");

    let ctx = TestContext::new(config)?;
    let ts = timestamp_millis();
    let input = format!("streams-input-{}", ts);
    let output = format!("streams-output-{}", ts);
    let application_id = format!("streams-test-app-{}", ts);

    info!("Step 1: Pre-creating input and output topics");
    ctx.create_topic(&input, 1).await?;
    ctx.create_topic(&output, 1).await?;
    tokio::time::sleep(TOPIC_PROPAGATION).await;

    let topology = uppercase_topology(&input, &output);
    info!("Streams topology:\n{}", topology.describe());

    info!("Step 2: Starting application '{}'", application_id);
    let mut app = StreamsApp::start(config, &application_id, topology, COMMIT_INTERVAL)?;
    if let Err(e) = app.wait_until_running(RUNNING_TIMEOUT).await {
        let _ = app.close(CLOSE_TIMEOUT).await;
        return Err(e);
    }
    info!("✅ {} reached RUNNING state", app.application_id());

    info!("Step 3: Producing to the input topic");
    let producer = create_producer(config)?;
    producer
        .send(
            FutureRecord::to(&input).key("stream-key").payload(INPUT_VALUE),
            TEST_TIMEOUT,
        )
        .await
        .map_err(|(err, _msg)| err)?;

    info!("Step 4: Verifying the output topic");
    let group = ctx.unique_group("streams-verify-group");
    let consumer = create_stream_consumer(config, &group)?;
    consumer.subscribe(&[&output])?;
    let records = consume_stream(&consumer, 1, OUTPUT_TIMEOUT).await;

    let processed = app.close(CLOSE_TIMEOUT).await?;
    info!("✅ Streams closed after processing {} record(s)", processed);

    let expected = format!("PROCESSED: {}", INPUT_VALUE.to_uppercase());
    let record = match records.first() {
        Some(record) => record,
        None => {
            return Err(format!(
                "No processed record on '{}' within {:?}",
                output, OUTPUT_TIMEOUT
            )
            .into())
        }
    };
    ensure_eq!(record.value_str(), Some(expected.as_str()), "Transformed value mismatch");
    ensure!(processed >= 1, "Application reports {} processed records", processed);
    info!("✅ Processed message verified: {}", expected);

    ctx.cleanup().await?;
    Ok(())
}
