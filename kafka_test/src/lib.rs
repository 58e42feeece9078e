//! Kafka version-compatibility scenarios
//!
//! Each scenario drives a live endpoint (a broker, or the gateway in front of
//! it) through one area of the protocol with rdkafka and returns a
//! `TestResult`. A failed check is an `Err`, never a panic, so the runner can
//! record it and continue.
//!
//! ## Scenarios
//!
//! - **producer**: basic produce/consume, custom serializers
//! - **idempotent**: idempotent producer
//! - **transaction**: exactly-once transactions
//! - **streams**: consume-transform-produce application
//! - **performance**: quotas and rate limiting
//! - **metadata**: API versions and cluster description
//! - **admin**: topic lifecycle and admin operations
//! - **consumer_group**: group listing and description
//! - **consumer**: offsets, commit modes, seek, assignment, pause/resume, lag
//!
//! `compat` hides the calls whose availability differs between client library
//! releases and broker versions.
//!
//! ## Usage
//!
//! ```bash
//! # Everything against the default gateway address
//! kafka_test
//!
//! # One scenario against a specific listener
//! kafka_test localhost:9092 consumer-groups
//!
//! # JSON output plus a status file for the report collector
//! kafka_test gateway:19092 compatibility --json --status-file results/x_status.txt
//! ```

// Infrastructure modules
pub mod assertions;
pub mod common;
pub mod compat;
pub mod config;
pub mod fixtures;
pub mod setup;
pub mod suite;

// Scenario modules
pub mod admin;
pub mod consumer;
pub mod consumer_group;
pub mod idempotent;
pub mod metadata;
pub mod performance;
pub mod producer;
pub mod protocol;
pub mod streams;
pub mod transaction;

// Re-export infrastructure
pub use assertions::*;
pub use common::{TestError, TestResult};
pub use config::SuiteConfig;
pub use fixtures::*;
pub use setup::{verify_server_ready, TestContext};
pub use suite::{TestSuiteResults, TestType};

// Re-export scenarios
pub use admin::{test_admin_operations, test_topic_lifecycle};
pub use consumer::test_consumer_operations;
pub use consumer_group::test_consumer_groups;
pub use idempotent::test_idempotent_producer;
pub use metadata::{test_api_versions, test_cluster_metadata};
pub use performance::{test_quotas, test_rate_limiting};
pub use producer::{test_basic_produce_consume, test_serializers};
pub use streams::test_streams;
pub use transaction::test_exactly_once;
