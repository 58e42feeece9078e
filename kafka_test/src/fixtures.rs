//! Test fixtures
//!
//! Test message type plus the produce/consume helpers used by most scenarios.

use std::time::{Duration, Instant};

use rdkafka::consumer::{BaseConsumer, StreamConsumer};
use rdkafka::message::{BorrowedMessage, Message};
use rdkafka::producer::{FutureProducer, FutureRecord};
use tracing::{debug, warn};

use crate::common::{TestResult, POLL_TIMEOUT, TEST_TIMEOUT};

/// A test message to be produced
#[derive(Clone, Debug, PartialEq)]
pub struct TestMessage {
    pub key: Option<String>,
    pub value: String,
    pub partition: Option<i32>,
}

impl TestMessage {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            key: None,
            value: value.into(),
            partition: None,
        }
    }

    pub fn with_key(value: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            key: Some(key.into()),
            value: value.into(),
            partition: None,
        }
    }

    pub fn to_partition(mut self, partition: i32) -> Self {
        self.partition = Some(partition);
        self
    }
}

/// A test topic that has been created
#[derive(Clone, Debug)]
pub struct TestTopic {
    pub name: String,
    pub partitions: i32,
}

impl TestTopic {
    /// Produce messages to this topic, returning (partition, offset) per message
    pub async fn produce(
        &self,
        producer: &FutureProducer,
        messages: &[TestMessage],
    ) -> TestResult<Vec<(i32, i64)>> {
        produce_messages(producer, &self.name, messages).await
    }
}

/// Produce messages one at a time, waiting for each delivery
pub async fn produce_messages(
    producer: &FutureProducer,
    topic: &str,
    messages: &[TestMessage],
) -> TestResult<Vec<(i32, i64)>> {
    let mut deliveries = Vec::with_capacity(messages.len());

    for msg in messages {
        let mut record = FutureRecord::to(topic).payload(&msg.value);

        if let Some(ref key) = msg.key {
            record = record.key(key);
        }

        if let Some(partition) = msg.partition {
            record = record.partition(partition);
        }

        let (partition, offset) = producer
            .send(record, TEST_TIMEOUT)
            .await
            .map_err(|(e, _)| e)?;

        debug!(topic, partition, offset, "Delivered");
        deliveries.push((partition, offset));
    }

    Ok(deliveries)
}

/// Owned copy of a consumed record
#[derive(Clone, Debug, PartialEq)]
pub struct ConsumedRecord {
    pub key: Option<String>,
    pub value: Option<Vec<u8>>,
    pub partition: i32,
    pub offset: i64,
}

impl ConsumedRecord {
    pub fn from_message(msg: &BorrowedMessage<'_>) -> Self {
        Self {
            key: msg.key().map(|k| String::from_utf8_lossy(k).into_owned()),
            value: msg.payload().map(|p| p.to_vec()),
            partition: msg.partition(),
            offset: msg.offset(),
        }
    }

    /// Value decoded as UTF-8, if present and valid
    pub fn value_str(&self) -> Option<&str> {
        self.value
            .as_deref()
            .and_then(|v| std::str::from_utf8(v).ok())
    }
}

/// Receive up to `expected` records from a StreamConsumer within `timeout`
pub async fn consume_stream(
    consumer: &StreamConsumer,
    expected: usize,
    timeout: Duration,
) -> Vec<ConsumedRecord> {
    let deadline = Instant::now() + timeout;
    let mut records = Vec::new();

    while records.len() < expected {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            break;
        }
        match tokio::time::timeout(remaining, consumer.recv()).await {
            Ok(Ok(msg)) => records.push(ConsumedRecord::from_message(&msg)),
            Ok(Err(e)) => warn!(error = %e, "Consumer error"),
            Err(_) => break,
        }
    }

    records
}

/// Poll up to `expected` records from a BaseConsumer within `timeout`
pub fn poll_records(
    consumer: &BaseConsumer,
    expected: usize,
    timeout: Duration,
) -> Vec<ConsumedRecord> {
    let start = Instant::now();
    let mut records = Vec::new();

    while records.len() < expected && start.elapsed() < timeout {
        match consumer.poll(POLL_TIMEOUT) {
            Some(Ok(msg)) => records.push(ConsumedRecord::from_message(&msg)),
            Some(Err(e)) => warn!(error = %e, "Consumer error"),
            None => {}
        }
    }

    records
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_str() {
        let record = ConsumedRecord {
            key: None,
            value: Some(vec![0xff, 0xfe]),
            partition: 0,
            offset: 0,
        };
        assert_eq!(record.value_str(), None);
    }
}
