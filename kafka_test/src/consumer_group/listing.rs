//! Group listing and description

use rdkafka::consumer::{CommitMode, Consumer};
use rdkafka::producer::FutureRecord;
use tracing::info;

use crate::common::{
    create_base_consumer, create_producer, TestResult, CONSUME_TIMEOUT, TEST_TIMEOUT,
};
use crate::compat::{normalize_group_state, normalize_protocol_type};
use crate::config::SuiteConfig;
use crate::fixtures::poll_records;
use crate::setup::TestContext;
use crate::{ensure, ensure_eq};

/// List every group, then describe the first one
///
/// A seed group is joined and committed beforehand so a fresh cluster still
/// has something to list. Its member stays alive until the checks are done.
pub async fn test_consumer_groups(config: &SuiteConfig) -> TestResult {
    info!("=== Test: Consumer Groups ===");

    let ctx = TestContext::new(config)?;
    let topic = ctx.unique_topic("group-seed").await;
    let seed_group = ctx.unique_group("group-seed");

    info!("Step 1: Seeding group '{}'", seed_group);
    ctx.create_topic(&topic, 1).await?;
    let producer = create_producer(config)?;
    producer
        .send(FutureRecord::to(&topic).key("seed").payload("seed"), TEST_TIMEOUT)
        .await
        .map_err(|(err, _msg)| err)?;

    let consumer = create_base_consumer(config, &seed_group)?;
    consumer.subscribe(&[&topic])?;
    let seeded = poll_records(&consumer, 1, CONSUME_TIMEOUT);
    if seeded.is_empty() {
        info!("Seed consumer received nothing, listing anyway");
    } else {
        consumer.commit_consumer_state(CommitMode::Sync)?;
    }

    info!("Step 2: Listing groups");
    let client = ctx.admin().inner();
    let list = client.fetch_group_list(None, TEST_TIMEOUT)?;
    let groups = list.groups();
    info!("✅ Consumer groups found: {}", groups.len());

    if groups.is_empty() {
        info!("No consumer groups active; nothing further to check");
        ctx.cleanup().await?;
        return Ok(());
    }

    for group in groups {
        ensure!(!group.name().is_empty(), "Listed group with an empty id");
        info!(
            "  - Group ID: {}, State: {}, Type: {}",
            group.name(),
            normalize_group_state(group.state()),
            normalize_protocol_type(group.protocol_type())
        );
    }

    if groups.iter().any(|g| g.name() == seed_group) {
        info!("✅ Seed group listed");
    } else {
        info!("Seed group not listed (endpoint may hide empty or new groups)");
    }

    info!("Step 3: Describing the first group");
    let first = groups[0].name().to_string();
    let described = client.fetch_group_list(Some(first.as_str()), TEST_TIMEOUT)?;
    let group = match described.groups().iter().find(|g| g.name() == first) {
        Some(group) => group,
        None => {
            return Err(format!("Group '{}' missing from its own description", first).into())
        }
    };
    ensure_eq!(group.name(), first.as_str(), "Described group id mismatch");
    let state = normalize_group_state(group.state());
    info!("✅ Group details for '{}':", first);
    info!("   Members: {}", group.members().len());
    info!("   State: {}", state);
    info!("   Protocol: {}", normalize_protocol_type(group.protocol()));
    for member in group.members() {
        ensure!(!member.id().is_empty(), "Group member without an id");
        info!("   - {} ({})", member.id(), member.client_id());
    }

    drop(consumer);
    ctx.cleanup().await?;
    Ok(())
}
