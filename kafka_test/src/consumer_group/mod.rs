//! Consumer group scenarios
//!
//! ListGroups and DescribeGroups as seen through the endpoint, including
//! brokers that omit group state or protocol type.

mod listing;

pub use listing::test_consumer_groups;
