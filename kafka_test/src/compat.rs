//! Client-library compatibility shim
//!
//! Scenarios run against many broker versions and may be built against
//! different librdkafka releases. This module hides the calls whose shape or
//! availability differs between them, so scenario code stays the same:
//!
//! - cluster and topic description are derived from metadata, which every
//!   broker version answers
//! - config alteration degrades to `Unsupported` instead of failing the run
//! - assignment strategies newer than the loaded library are reported as such
//! - group state / protocol type fall back to `UNKNOWN` when a broker omits them

use std::fmt;
use std::time::Duration;

use rdkafka::admin::{AdminClient, AlterConfig, ResourceSpecifier};
use rdkafka::client::{Client, ClientContext, DefaultClientContext};
use rdkafka::error::KafkaError;
use rdkafka::types::RDKafkaErrorCode;
use tracing::debug;

use crate::common::{admin_options, TestResult};

pub const UNKNOWN: &str = "UNKNOWN";

/// librdkafka release loaded at runtime
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClientLibraryVersion {
    /// `0xMMmmrrxx` as reported by `rd_kafka_version()`
    pub hex: i32,
    pub text: String,
}

impl ClientLibraryVersion {
    pub fn detect() -> Self {
        let (hex, text) = rdkafka::util::get_rdkafka_version();
        Self { hex, text }
    }

    pub fn major(&self) -> u8 {
        ((self.hex >> 24) & 0xff) as u8
    }

    pub fn minor(&self) -> u8 {
        ((self.hex >> 16) & 0xff) as u8
    }

    pub fn patch(&self) -> u8 {
        ((self.hex >> 8) & 0xff) as u8
    }

    pub fn at_least(&self, major: u8, minor: u8, patch: u8) -> bool {
        (self.major(), self.minor(), self.patch()) >= (major, minor, patch)
    }

    /// cooperative-sticky arrived in librdkafka 1.6.0
    pub fn supports_cooperative_sticky(&self) -> bool {
        self.at_least(1, 6, 0)
    }
}

impl fmt::Display for ClientLibraryVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "librdkafka {} (0x{:08x})", self.text, self.hex)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BrokerInfo {
    pub id: i32,
    pub host: String,
    pub port: i32,
}

/// What a DescribeCluster call would return, assembled from metadata
#[derive(Clone, Debug)]
pub struct ClusterDescription {
    pub cluster_id: Option<String>,
    /// Broker that answered the metadata request
    pub orig_broker_id: i32,
    pub brokers: Vec<BrokerInfo>,
    pub topics: Vec<String>,
}

pub fn describe_cluster<C: ClientContext>(
    client: &Client<C>,
    timeout: Duration,
) -> TestResult<ClusterDescription> {
    let metadata = client.fetch_metadata(None, timeout)?;
    let cluster_id = client.fetch_cluster_id(timeout);

    Ok(ClusterDescription {
        cluster_id,
        orig_broker_id: metadata.orig_broker_id(),
        brokers: metadata
            .brokers()
            .iter()
            .map(|b| BrokerInfo {
                id: b.id(),
                host: b.host().to_string(),
                port: b.port(),
            })
            .collect(),
        topics: metadata
            .topics()
            .iter()
            .filter(|t| t.error().is_none())
            .map(|t| t.name().to_string())
            .collect(),
    })
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TopicDescription {
    pub name: String,
    pub partitions: Vec<i32>,
}

/// Describe a single topic, `None` when it does not exist.
///
/// Uses an all-topics metadata request: asking for the topic by name could
/// auto-create it on brokers that allow that.
pub fn describe_topic<C: ClientContext>(
    client: &Client<C>,
    topic: &str,
    timeout: Duration,
) -> TestResult<Option<TopicDescription>> {
    let metadata = client.fetch_metadata(None, timeout)?;
    let description = metadata
        .topics()
        .iter()
        .find(|t| t.name() == topic && t.error().is_none())
        .map(|t| TopicDescription {
            name: t.name().to_string(),
            partitions: t.partitions().iter().map(|p| p.id()).collect(),
        });
    Ok(description)
}

/// Result of an optional config change
#[derive(Debug)]
pub enum ConfigAlterOutcome {
    Applied,
    /// The broker (or gateway) does not support the request
    Unsupported(String),
    Failed(String),
}

fn is_unsupported(code: RDKafkaErrorCode) -> bool {
    matches!(
        code,
        RDKafkaErrorCode::UnsupportedVersion
            | RDKafkaErrorCode::InvalidRequest
            | RDKafkaErrorCode::UnsupportedForMessageFormat
    )
}

/// Alter topic configs via the AlterConfigs API.
///
/// Never fails the caller: every outcome is reported in the return value.
pub async fn alter_topic_config(
    admin: &AdminClient<DefaultClientContext>,
    topic: &str,
    entries: &[(&str, &str)],
) -> ConfigAlterOutcome {
    let alter = entries
        .iter()
        .fold(AlterConfig::new(ResourceSpecifier::Topic(topic)), |cfg, (k, v)| cfg.set(k, v));

    match admin.alter_configs(&[alter], &admin_options()).await {
        Ok(results) => {
            for result in results {
                if let Err((_, code)) = result {
                    return if is_unsupported(code) {
                        ConfigAlterOutcome::Unsupported(code.to_string())
                    } else {
                        ConfigAlterOutcome::Failed(code.to_string())
                    };
                }
            }
            ConfigAlterOutcome::Applied
        }
        Err(KafkaError::AdminOp(code)) if is_unsupported(code) => {
            ConfigAlterOutcome::Unsupported(code.to_string())
        }
        Err(e) => ConfigAlterOutcome::Failed(e.to_string()),
    }
}

/// `partition.assignment.strategy` values exercised by the consumer scenario
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AssignmentStrategy {
    Range,
    RoundRobin,
    Sticky,
}

impl AssignmentStrategy {
    pub const ALL: [AssignmentStrategy; 3] = [
        AssignmentStrategy::Range,
        AssignmentStrategy::RoundRobin,
        AssignmentStrategy::Sticky,
    ];

    pub fn config_value(&self) -> &'static str {
        match self {
            AssignmentStrategy::Range => "range",
            AssignmentStrategy::RoundRobin => "roundrobin",
            AssignmentStrategy::Sticky => "cooperative-sticky",
        }
    }

    /// A failure with this strategy is logged, not counted
    pub fn is_optional(&self) -> bool {
        matches!(self, AssignmentStrategy::Sticky)
    }

    pub fn is_supported_by(&self, version: &ClientLibraryVersion) -> bool {
        match self {
            AssignmentStrategy::Sticky => version.supports_cooperative_sticky(),
            _ => true,
        }
    }
}

impl fmt::Display for AssignmentStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.config_value())
    }
}

/// Group state as reported, or `UNKNOWN` when the broker left it empty
pub fn normalize_group_state(state: &str) -> String {
    normalize(state)
}

/// Group protocol type (`consumer`, `connect`, ...), or `UNKNOWN`
pub fn normalize_protocol_type(protocol_type: &str) -> String {
    normalize(protocol_type)
}

fn normalize(value: &str) -> String {
    let value = value.trim();
    if value.is_empty() {
        debug!("Empty group attribute, using {}", UNKNOWN);
        UNKNOWN.to_string()
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn version(hex: i32) -> ClientLibraryVersion {
        ClientLibraryVersion {
            hex,
            text: String::new(),
        }
    }

    #[test]
    fn test_version_components() {
        let v = version(0x020300ff);
        assert_eq!((v.major(), v.minor(), v.patch()), (2, 3, 0));
        assert!(v.at_least(2, 3, 0));
        assert!(!v.at_least(2, 4, 0));
    }

    #[test]
    fn test_cooperative_sticky_support() {
        assert!(!version(0x010502ff).supports_cooperative_sticky());
        assert!(version(0x010600ff).supports_cooperative_sticky());
        assert!(AssignmentStrategy::Range.is_supported_by(&version(0x000b00ff)));
        assert!(!AssignmentStrategy::Sticky.is_supported_by(&version(0x010502ff)));
    }

    #[test]
    fn test_detect_matches_linked_library() {
        let v = ClientLibraryVersion::detect();
        assert!(v.major() >= 1);
        assert!(v.text.starts_with(&format!("{}.{}", v.major(), v.minor())));
    }

    #[test]
    fn test_strategy_values() {
        let values: Vec<&str> = AssignmentStrategy::ALL
            .iter()
            .map(|s| s.config_value())
            .collect();
        assert_eq!(values, vec!["range", "roundrobin", "cooperative-sticky"]);
        assert!(AssignmentStrategy::Sticky.is_optional());
        assert!(!AssignmentStrategy::Range.is_optional());
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize_group_state("Stable"), "Stable");
        assert_eq!(normalize_group_state(""), UNKNOWN);
        assert_eq!(normalize_protocol_type("  "), UNKNOWN);
        assert_eq!(normalize_protocol_type("consumer"), "consumer");
    }

    #[test]
    fn test_unsupported_codes() {
        assert!(is_unsupported(RDKafkaErrorCode::UnsupportedVersion));
        assert!(!is_unsupported(RDKafkaErrorCode::TopicAuthorizationFailed));
    }
}
