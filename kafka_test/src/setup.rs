//! Test environment setup and teardown
//!
//! Provides TestContext for test isolation with automatic cleanup via RAII.

use std::sync::Arc;

use rdkafka::admin::{AdminClient, NewTopic, TopicReplication};
use rdkafka::client::DefaultClientContext;
use rdkafka::producer::{FutureProducer, Producer};
use rdkafka::types::RDKafkaErrorCode;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::assertions::AssertionError;
use crate::common::{admin_options, create_admin_client, timestamp_millis, TestResult, TEST_TIMEOUT};
use crate::config::SuiteConfig;

/// Test context providing isolation and automatic cleanup
///
/// Each scenario should create its own TestContext which:
/// - Generates unique topic/group names to prevent collisions
/// - Tracks created topics for cleanup
/// - Deletes them on drop
pub struct TestContext {
    /// Unique identifier for this test run
    pub test_id: String,
    pub config: SuiteConfig,
    admin: Arc<AdminClient<DefaultClientContext>>,
    /// Topics created during this test
    topics_created: Arc<Mutex<Vec<String>>>,
}

impl TestContext {
    pub fn new(config: &SuiteConfig) -> TestResult<Self> {
        Ok(Self {
            test_id: Uuid::new_v4().to_string()[..8].to_string(),
            config: config.clone(),
            admin: Arc::new(create_admin_client(config)?),
            topics_created: Arc::new(Mutex::new(Vec::new())),
        })
    }

    pub fn admin(&self) -> &AdminClient<DefaultClientContext> {
        &self.admin
    }

    /// Generate a unique topic name, tracked for cleanup
    pub async fn unique_topic(&self, base: &str) -> String {
        let uuid_str = Uuid::new_v4().to_string();
        let name = format!("{}-{}-{}", base, self.test_id, &uuid_str[..8]);
        self.track_topic(&name).await;
        name
    }

    /// `<base>-<millis>`, tracked for cleanup
    pub async fn timestamped_topic(&self, base: &str) -> String {
        let name = format!("{}-{}", base, timestamp_millis());
        self.track_topic(&name).await;
        name
    }

    /// Generate a unique consumer group ID
    ///
    /// Groups expire on their own once their members leave, so they are not tracked.
    pub fn unique_group(&self, base: &str) -> String {
        let uuid_str = Uuid::new_v4().to_string();
        format!("{}-{}-{}", base, self.test_id, &uuid_str[..8])
    }

    pub async fn track_topic(&self, name: &str) {
        let mut topics = self.topics_created.lock().await;
        if !topics.iter().any(|t| t == name) {
            topics.push(name.to_string());
        }
    }

    /// Stop tracking a topic the scenario already deleted itself
    pub async fn forget_topic(&self, name: &str) {
        self.topics_created.lock().await.retain(|t| t != name);
    }

    /// Create a topic through the admin API and track it.
    ///
    /// An already existing topic counts as success.
    pub async fn create_topic(&self, name: &str, partitions: i32) -> TestResult {
        self.track_topic(name).await;
        let new_topic = NewTopic::new(name, partitions, TopicReplication::Fixed(1));
        let results = self
            .admin
            .create_topics(&[new_topic], &admin_options())
            .await?;

        for result in results {
            match result {
                Ok(topic) => debug!(topic = %topic, partitions, "Topic created"),
                Err((topic, RDKafkaErrorCode::TopicAlreadyExists)) => {
                    debug!(topic = %topic, "Topic already exists")
                }
                Err((topic, code)) => {
                    return Err(Box::new(AssertionError::new(
                        format!("Failed to create topic '{}'", topic),
                        "topic created",
                        code.to_string(),
                    )))
                }
            }
        }
        Ok(())
    }

    /// Manually trigger cleanup (also attempted on drop)
    pub async fn cleanup(&self) -> TestResult {
        let topics: Vec<String> = self.topics_created.lock().await.drain(..).collect();
        delete_topics(&self.admin, &topics).await;
        Ok(())
    }
}

async fn delete_topics(admin: &AdminClient<DefaultClientContext>, topics: &[String]) {
    if topics.is_empty() {
        return;
    }
    let names: Vec<&str> = topics.iter().map(String::as_str).collect();
    match admin.delete_topics(&names, &admin_options()).await {
        Ok(results) => {
            for result in results {
                if let Err((topic, code)) = result {
                    if code != RDKafkaErrorCode::UnknownTopicOrPartition {
                        warn!(topic = %topic, error = %code, "Topic cleanup failed");
                    }
                }
            }
        }
        Err(e) => warn!(error = %e, "Topic cleanup request failed"),
    }
}

impl Drop for TestContext {
    fn drop(&mut self) {
        // Best-effort: nothing is cleaned if the runtime is already shutting down
        let topics = self.topics_created.clone();
        let admin = self.admin.clone();

        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            handle.spawn(async move {
                let topics: Vec<String> = topics.lock().await.drain(..).collect();
                delete_topics(&admin, &topics).await;
            });
        }
    }
}

/// Verify that the endpoint under test answers a metadata request
pub async fn verify_server_ready(config: &SuiteConfig) -> TestResult {
    let producer: FutureProducer = config
        .client_config("readiness")
        .set("message.timeout.ms", "5000")
        .create()?;

    // fetch_metadata blocks for up to TEST_TIMEOUT
    let brokers = tokio::task::spawn_blocking(move || {
        producer
            .client()
            .fetch_metadata(None, TEST_TIMEOUT)
            .map(|metadata| metadata.brokers().len())
    })
    .await??;

    info!(
        bootstrap = %config.bootstrap_servers,
        brokers,
        "Endpoint is reachable"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unreachable_endpoint_is_an_error() {
        // Nothing listens on port 1. The single-threaded test runtime must keep
        // running other tasks while the metadata request waits out its timeout.
        let config = SuiteConfig::from_lookup(Some("127.0.0.1:1".into()), |_| None);
        let ticker = tokio::spawn(async {
            tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        });
        assert!(verify_server_ready(&config).await.is_err());
        assert!(ticker.is_finished());
    }

    #[tokio::test]
    async fn test_unique_names_are_unique() {
        // Client creation does not connect, so no broker is needed here
        let ctx = TestContext::new(&SuiteConfig::from_lookup(Some("localhost:1".into()), |_| None))
            .unwrap();
        let topic1 = ctx.unique_topic("test").await;
        let topic2 = ctx.unique_topic("test").await;
        assert_ne!(topic1, topic2);
        assert!(topic1.starts_with(&format!("test-{}-", ctx.test_id)));

        ctx.forget_topic(&topic1).await;
        ctx.forget_topic(&topic2).await;
        assert!(ctx.topics_created.lock().await.is_empty());
    }
}
