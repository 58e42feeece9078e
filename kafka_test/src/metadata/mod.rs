//! Cluster metadata scenarios
//!
//! - `api`: cluster id, broker list and topic listing, plus a raw ApiVersions probe
//! - `cluster`: per-broker validation of the described cluster

mod api_versions;
mod cluster;

pub use api_versions::test_api_versions;
pub use cluster::test_cluster_metadata;
