//! Pause and resume consumption
//!
//! New records are produced while the assignment is paused: the paused poll
//! must not see them, the poll after resume must.

use std::time::Duration;

use rdkafka::consumer::Consumer;
use rdkafka::producer::FutureProducer;
use tracing::info;

use super::{produce_round, wait_for_assignment, RECORD_COUNT};
use crate::common::{create_base_consumer, TestResult, CONSUME_TIMEOUT};
use crate::config::SuiteConfig;
use crate::fixtures::{poll_records, TestTopic};
use crate::setup::TestContext;
use crate::{ensure, ensure_eq};

const PAUSED_POLL: Duration = Duration::from_secs(2);

pub async fn test_pause_resume(
    config: &SuiteConfig,
    ctx: &TestContext,
    topic: &TestTopic,
    producer: &FutureProducer,
) -> TestResult {
    let group = ctx.unique_group("pause-resume-group");
    let consumer = create_base_consumer(config, &group)?;
    consumer.subscribe(&[&topic.name])?;

    let (assignment, mut initial) = wait_for_assignment(&consumer, CONSUME_TIMEOUT)?;
    ensure!(assignment.count() > 0, "No partition assignment for pause/resume");
    let remaining = RECORD_COUNT.saturating_sub(initial.len());
    initial.extend(poll_records(&consumer, remaining, CONSUME_TIMEOUT));

    consumer.pause(&assignment)?;
    info!("   Paused {} partitions", assignment.count());

    let produced = produce_round(producer, topic, "paused-round").await?;
    let paused = poll_records(&consumer, 1, PAUSED_POLL);

    consumer.resume(&assignment)?;
    info!("   Resumed {} partitions", assignment.count());
    let resumed = poll_records(&consumer, produced, CONSUME_TIMEOUT);

    info!("   Initial poll: {} records", initial.len());
    info!("   Paused poll: {} records", paused.len());
    info!("   Resumed poll: {} records", resumed.len());

    ensure_eq!(paused.len(), 0, "Records delivered while paused");
    ensure!(
        !resumed.is_empty(),
        "No records after resume ({} produced while paused)",
        produced
    );
    Ok(())
}
