//! Cluster description checks

use tracing::info;

use crate::common::{create_admin_client, TestResult, TEST_TIMEOUT};
use crate::compat::describe_cluster;
use crate::config::SuiteConfig;
use crate::ensure;

pub async fn test_cluster_metadata(config: &SuiteConfig) -> TestResult {
    info!("=== Test: Cluster Metadata ===");

    let admin = create_admin_client(config)?;
    let cluster = describe_cluster(admin.inner(), TEST_TIMEOUT)?;

    let cluster_id = cluster.cluster_id.clone().unwrap_or_default();
    ensure!(!cluster_id.is_empty(), "Cluster id is missing");
    ensure!(!cluster.brokers.is_empty(), "No broker in metadata");
    info!("Cluster ID: {}", cluster_id);
    info!("Total brokers: {}", cluster.brokers.len());

    for broker in &cluster.brokers {
        ensure!(broker.id >= 0, "Broker id {} is negative", broker.id);
        ensure!(!broker.host.is_empty(), "Broker {} has no host", broker.id);
        ensure!(broker.port > 0, "Broker {} has port {}", broker.id, broker.port);
        info!("   - Broker {}: {}:{}", broker.id, broker.host, broker.port);
    }

    // -1 means the answer came over a bootstrap connection
    let answering = cluster.orig_broker_id;
    if answering >= 0 {
        ensure!(
            cluster.brokers.iter().any(|b| b.id == answering),
            "Answering broker {} is not among the listed brokers",
            answering
        );
        info!("Metadata answered by broker {}", answering);
    } else {
        info!("Metadata answered over the bootstrap connection");
    }
    info!("✅ Cluster metadata valid");
    Ok(())
}
