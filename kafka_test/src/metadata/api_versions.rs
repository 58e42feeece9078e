//! API reachability through the endpoint

use gateway_compat::api_keys::api_name;
use tracing::info;

use crate::common::{create_admin_client, TestResult, TEST_TIMEOUT};
use crate::compat::describe_cluster;
use crate::config::{SecurityProtocol, SuiteConfig};
use crate::ensure;
use crate::protocol::probe_api_versions;

/// Cluster-level APIs answer and the endpoint advertises its API ranges
///
/// The client library does not expose the controller id, so every listed
/// broker id is checked instead.
pub async fn test_api_versions(config: &SuiteConfig) -> TestResult {
    info!("=== Test: API Versions ===");

    let admin = create_admin_client(config)?;
    let cluster = describe_cluster(admin.inner(), TEST_TIMEOUT)?;

    let cluster_id = cluster.cluster_id.unwrap_or_default();
    ensure!(!cluster_id.is_empty(), "Cluster id is missing");
    ensure!(!cluster.brokers.is_empty(), "No broker in metadata");
    ensure!(
        cluster.brokers.iter().all(|b| b.id >= 0),
        "Negative broker id in {:?}",
        cluster.brokers
    );
    info!("✅ Cluster ID: {}", cluster_id);
    info!("✅ Broker nodes: {}", cluster.brokers.len());
    info!("✅ Topics available: {}", cluster.topics.len());

    if config.security.protocol() != SecurityProtocol::Plaintext {
        info!(
            "Skipping raw ApiVersions probe on {} listener",
            config.security.protocol()
        );
        return Ok(());
    }

    let client_id = format!("{}-probe", config.client_id_prefix);
    let response = probe_api_versions(&config.bootstrap_servers, &client_id, TEST_TIMEOUT).await?;
    ensure!(
        response.error_code == 0,
        "ApiVersions returned error code {}",
        response.error_code
    );
    ensure!(!response.apis.is_empty(), "ApiVersions advertised no API");

    info!("✅ Endpoint advertises {} APIs", response.apis.len());
    for range in &response.apis {
        info!(
            "   {:>3} {:<28} v{}-v{}",
            range.api_key,
            api_name(range.api_key).unwrap_or("UNKNOWN"),
            range.min_version,
            range.max_version
        );
    }

    Ok(())
}
