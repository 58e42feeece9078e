//! Auto-commit versus manual commit

use std::time::Duration;

use rdkafka::consumer::{CommitMode, Consumer};
use tracing::info;

use super::RECORD_COUNT;
use crate::common::{
    create_auto_commit_consumer, create_base_consumer, TestResult, CONSUME_TIMEOUT,
};
use crate::config::SuiteConfig;
use crate::ensure;
use crate::fixtures::{poll_records, TestTopic};
use crate::setup::TestContext;

const AUTO_COMMIT_INTERVAL: Duration = Duration::from_millis(1000);

/// Long enough for at least one auto-commit tick
const AUTO_COMMIT_GRACE: Duration = Duration::from_millis(1500);

pub async fn test_commit_modes(
    config: &SuiteConfig,
    ctx: &TestContext,
    topic: &TestTopic,
) -> TestResult {
    let group = ctx.unique_group("commit-modes-group");

    let auto_count = {
        let consumer =
            create_auto_commit_consumer(config, &format!("{}-auto", group), AUTO_COMMIT_INTERVAL)?;
        consumer.subscribe(&[&topic.name])?;
        let count = poll_records(&consumer, RECORD_COUNT, CONSUME_TIMEOUT).len();
        tokio::time::sleep(AUTO_COMMIT_GRACE).await;
        count
    };

    let manual_count = {
        let consumer = create_base_consumer(config, &format!("{}-manual", group))?;
        consumer.subscribe(&[&topic.name])?;
        let count = poll_records(&consumer, RECORD_COUNT, CONSUME_TIMEOUT).len();
        if count > 0 {
            consumer.commit_consumer_state(CommitMode::Sync)?;
        }
        count
    };

    ensure!(auto_count > 0, "Auto-commit consumer received nothing");
    ensure!(manual_count > 0, "Manual-commit consumer received nothing");
    info!("   ✅ Auto-commit mode: processed {} messages", auto_count);
    info!("   ✅ Manual-commit mode: processed {} messages", manual_count);
    Ok(())
}
