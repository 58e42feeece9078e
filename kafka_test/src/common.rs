//! Common utilities shared across scenario modules
//!
//! Client builders (every one of them applies the suite's security settings),
//! shared timeouts and the scenario result type.

use std::time::Duration;

use rdkafka::admin::{AdminClient, AdminOptions};
use rdkafka::client::DefaultClientContext;
use rdkafka::consumer::{BaseConsumer, StreamConsumer};
use rdkafka::producer::FutureProducer;

use crate::config::SuiteConfig;

/// Boxed error that can cross task boundaries
pub type TestError = Box<dyn std::error::Error + Send + Sync>;

/// Scenario result type
pub type TestResult<T = ()> = Result<T, TestError>;

/// Default poll timeout for consumer operations
pub const POLL_TIMEOUT: Duration = Duration::from_millis(100);

/// Default timeout for a single client call
pub const TEST_TIMEOUT: Duration = Duration::from_secs(10);

/// How long a scenario waits for records to show up
pub const CONSUME_TIMEOUT: Duration = Duration::from_secs(15);

/// Extended timeout for batch operations
pub const BATCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Producer with acks=all, the baseline for most scenarios
pub fn create_producer(config: &SuiteConfig) -> TestResult<FutureProducer> {
    let producer: FutureProducer = config
        .client_config("producer")
        .set("acks", "all")
        .set("message.timeout.ms", "10000")
        .create()?;

    Ok(producer)
}

/// Idempotent producer (enable.idempotence=true)
pub fn create_idempotent_producer(config: &SuiteConfig) -> TestResult<FutureProducer> {
    let producer: FutureProducer = config
        .client_config("idempotent-producer")
        .set("enable.idempotence", "true")
        .set("acks", "all")
        .set("max.in.flight.requests.per.connection", "5")
        .set("message.timeout.ms", "10000")
        .create()?;

    Ok(producer)
}

/// Transactional producer; callers still need `init_transactions`
pub fn create_transactional_producer(
    config: &SuiteConfig,
    transactional_id: &str,
) -> TestResult<FutureProducer> {
    let producer: FutureProducer = config
        .client_config("txn-producer")
        .set("transactional.id", transactional_id)
        .set("enable.idempotence", "true")
        .set("acks", "all")
        .set("transaction.timeout.ms", "60000")
        .set("message.timeout.ms", "10000")
        .create()?;

    Ok(producer)
}

/// Producer that ships every record in its own request, to provoke throttling
pub fn create_unbatched_producer(config: &SuiteConfig) -> TestResult<FutureProducer> {
    let producer: FutureProducer = config
        .client_config("quota-producer")
        .set("batch.size", "1")
        .set("linger.ms", "0")
        .set("acks", "1")
        .set("message.timeout.ms", "30000")
        .create()?;

    Ok(producer)
}

/// Producer with batching and a bounded local queue
pub fn create_batching_producer(config: &SuiteConfig) -> TestResult<FutureProducer> {
    let producer: FutureProducer = config
        .client_config("rate-producer")
        .set("batch.size", "16384")
        .set("linger.ms", "100")
        // 32 MiB, expressed in KiB
        .set("queue.buffering.max.kbytes", "32768")
        .set("message.timeout.ms", "10000")
        .create()?;

    Ok(producer)
}

/// BaseConsumer reading from the earliest offset with manual commits
pub fn create_base_consumer(config: &SuiteConfig, group_id: &str) -> TestResult<BaseConsumer> {
    let consumer: BaseConsumer = config
        .client_config("consumer")
        .set("group.id", group_id)
        .set("auto.offset.reset", "earliest")
        .set("enable.auto.commit", "false")
        .set("session.timeout.ms", "10000")
        .create()?;

    Ok(consumer)
}

/// BaseConsumer with auto-commit every `interval`
pub fn create_auto_commit_consumer(
    config: &SuiteConfig,
    group_id: &str,
    interval: Duration,
) -> TestResult<BaseConsumer> {
    let consumer: BaseConsumer = config
        .client_config("auto-commit-consumer")
        .set("group.id", group_id)
        .set("auto.offset.reset", "earliest")
        .set("enable.auto.commit", "true")
        .set("auto.commit.interval.ms", interval.as_millis().to_string())
        .set("session.timeout.ms", "10000")
        .create()?;

    Ok(consumer)
}

/// BaseConsumer using the given `partition.assignment.strategy`
pub fn create_strategy_consumer(
    config: &SuiteConfig,
    group_id: &str,
    strategy: &str,
) -> TestResult<BaseConsumer> {
    let consumer: BaseConsumer = config
        .client_config("strategy-consumer")
        .set("group.id", group_id)
        .set("auto.offset.reset", "earliest")
        .set("enable.auto.commit", "false")
        .set("partition.assignment.strategy", strategy)
        .set("session.timeout.ms", "10000")
        .create()?;

    Ok(consumer)
}

/// StreamConsumer reading from the earliest offset
pub fn create_stream_consumer(config: &SuiteConfig, group_id: &str) -> TestResult<StreamConsumer> {
    let consumer: StreamConsumer = config
        .client_config("stream-consumer")
        .set("group.id", group_id)
        .set("auto.offset.reset", "earliest")
        .set("enable.auto.commit", "false")
        .set("session.timeout.ms", "10000")
        .create()?;

    Ok(consumer)
}

/// StreamConsumer that only sees committed transactional records
pub fn create_read_committed_consumer(
    config: &SuiteConfig,
    group_id: &str,
) -> TestResult<StreamConsumer> {
    let consumer: StreamConsumer = config
        .client_config("read-committed-consumer")
        .set("group.id", group_id)
        .set("auto.offset.reset", "earliest")
        .set("enable.auto.commit", "false")
        .set("isolation.level", "read_committed")
        .create()?;

    Ok(consumer)
}

pub fn create_admin_client(config: &SuiteConfig) -> TestResult<AdminClient<DefaultClientContext>> {
    let admin: AdminClient<DefaultClientContext> = config.client_config("admin").create()?;
    Ok(admin)
}

/// Admin options with both operation and request timeouts set
pub fn admin_options() -> AdminOptions {
    AdminOptions::new()
        .operation_timeout(Some(TEST_TIMEOUT))
        .request_timeout(Some(TEST_TIMEOUT))
}

/// Milliseconds since the epoch, used to stamp topic and transaction names
pub fn timestamp_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
