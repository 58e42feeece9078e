//! Kafka protocol API key reference
//!
//! Maps the snake_case API names reported by the gateway (and used in the
//! reports) to their numeric protocol keys.
//! See: https://kafka.apache.org/protocol.html#protocol_api_keys

/// All known API names with their numeric keys, sorted by key.
///
/// Keys 56..=59 are not assigned to client-facing APIs and are absent.
static API_KEYS: &[(&str, i16)] = &[
    ("produce", 0),
    ("fetch", 1),
    ("list_offsets", 2),
    ("metadata", 3),
    ("leader_and_isr", 4),
    ("stop_replica", 5),
    ("update_metadata", 6),
    ("controlled_shutdown", 7),
    ("offset_commit", 8),
    ("offset_fetch", 9),
    ("find_coordinator", 10),
    ("join_group", 11),
    ("heartbeat", 12),
    ("leave_group", 13),
    ("sync_group", 14),
    ("describe_groups", 15),
    ("list_groups", 16),
    ("sasl_handshake", 17),
    ("api_versions", 18),
    ("create_topics", 19),
    ("delete_topics", 20),
    ("delete_records", 21),
    ("init_producer_id", 22),
    ("offset_for_leader_epoch", 23),
    ("add_partitions_to_txn", 24),
    ("add_offsets_to_txn", 25),
    ("end_txn", 26),
    ("write_txn_markers", 27),
    ("txn_offset_commit", 28),
    ("describe_acls", 29),
    ("create_acls", 30),
    ("delete_acls", 31),
    ("describe_configs", 32),
    ("alter_configs", 33),
    ("alter_replica_log_dirs", 34),
    ("describe_log_dirs", 35),
    ("sasl_authenticate", 36),
    ("create_partitions", 37),
    ("create_delegation_token", 38),
    ("renew_delegation_token", 39),
    ("expire_delegation_token", 40),
    ("describe_delegation_token", 41),
    ("delete_groups", 42),
    ("elect_leaders", 43),
    ("incremental_alter_configs", 44),
    ("alter_partition_reassignments", 45),
    ("list_partition_reassignments", 46),
    ("offset_delete", 47),
    ("describe_client_quotas", 48),
    ("alter_client_quotas", 49),
    ("describe_user_scram_credentials", 50),
    ("alter_user_scram_credentials", 51),
    ("alter_partition", 52),
    ("update_features", 53),
    ("envelope", 54),
    ("fetch_snapshot", 55),
    ("describe_cluster", 60),
    ("describe_producers", 61),
    ("broker_registration", 62),
    ("broker_heartbeat", 63),
    ("unregister_broker", 64),
    ("describe_transactions", 65),
    ("list_transactions", 66),
    ("allocate_producer_ids", 67),
    ("consumer_group_heartbeat", 68),
    ("consumer_group_describe", 69),
    ("controller_registration", 70),
    ("get_telemetry_subscriptions", 71),
    ("push_telemetry", 72),
    ("assign_replicas_to_dirs", 73),
    ("list_client_metrics_resources", 74),
    ("describe_topic_partitions", 75),
];

/// Look up the numeric key for an API name (case-insensitive)
pub fn api_key_for(name: &str) -> Option<i16> {
    let name = name.trim();
    API_KEYS
        .iter()
        .find(|(known, _)| known.eq_ignore_ascii_case(name))
        .map(|(_, key)| *key)
}

/// Look up the API name for a numeric key
pub fn api_name(key: i16) -> Option<&'static str> {
    API_KEYS
        .binary_search_by_key(&key, |(_, k)| *k)
        .ok()
        .map(|idx| API_KEYS[idx].0)
}

/// Numeric key as text, or the name itself when it is not a known API
pub fn api_key_display(name: &str) -> String {
    match api_key_for(name) {
        Some(key) => key.to_string(),
        None => name.to_string(),
    }
}

/// Full table, sorted by key
pub fn all() -> &'static [(&'static str, i16)] {
    API_KEYS
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_keys() {
        assert_eq!(api_key_for("produce"), Some(0));
        assert_eq!(api_key_for("api_versions"), Some(18));
        assert_eq!(api_key_for("describe_topic_partitions"), Some(75));
    }

    #[test]
    fn test_case_insensitive_lookup() {
        assert_eq!(api_key_for("METADATA"), Some(3));
        assert_eq!(api_key_for("Find_Coordinator"), Some(10));
    }

    #[test]
    fn test_unknown_name_displays_as_itself() {
        assert_eq!(api_key_for("frobnicate"), None);
        assert_eq!(api_key_display("frobnicate"), "frobnicate");
        assert_eq!(api_key_display("fetch"), "1");
    }

    #[test]
    fn test_reverse_lookup() {
        assert_eq!(api_name(19), Some("create_topics"));
        assert_eq!(api_name(60), Some("describe_cluster"));
        assert_eq!(api_name(57), None);
    }

    #[test]
    fn test_table_sorted_and_unique() {
        let keys: Vec<i16> = all().iter().map(|(_, k)| *k).collect();
        assert!(keys.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(all().first(), Some(&("produce", 0)));
        assert_eq!(all().last(), Some(&("describe_topic_partitions", 75)));
    }
}
