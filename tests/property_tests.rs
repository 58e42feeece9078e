// Property-based tests using proptest
//
// These generate random inputs to check the parsers do not depend on
// incidental formatting (label order, name casing, version strings).

#[cfg(test)]
mod property_tests {
    use gateway_compat::api_keys::{all, api_key_for, api_name};
    use gateway_compat::metrics::parse_line;
    use gateway_compat::results::Combination;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn test_label_order_irrelevant(key in "[A-Z_]{1,20}", version in 0u16..20, value in 0u32..1_000_000) {
            // Property: swapping label order yields the same sample
            let a = format!(
                "kroxylicious_client_to_proxy_request_total{{api_key=\"{}\",api_version=\"{}\"}} {}",
                key, version, value
            );
            let b = format!(
                "kroxylicious_client_to_proxy_request_total{{api_version=\"{}\",api_key=\"{}\"}} {}",
                version, key, value
            );
            let sa = parse_line(&a).unwrap().unwrap();
            let sb = parse_line(&b).unwrap().unwrap();
            prop_assert_eq!(sa, sb);
        }

        #[test]
        fn test_api_lookup_ignores_case(idx in 0usize..73, upper in any::<bool>()) {
            let (name, key) = all()[idx % all().len()];
            let probe = if upper { name.to_uppercase() } else { name.to_string() };
            prop_assert_eq!(api_key_for(&probe), Some(key));
            prop_assert_eq!(api_name(key), Some(name));
        }

        #[test]
        fn test_combination_file_names(client in "[0-9]{1,2}\\.[0-9]{1,2}(\\.[0-9])?", server in "[0-9]{1,2}\\.[0-9]{1,2}(\\.[0-9])?") {
            // Property: a formatted file name parses back to the same combination
            let combination = Combination::new(client, server);
            prop_assert_eq!(
                Combination::from_file_name(&combination.metrics_file_name()).unwrap(),
                combination.clone()
            );
            prop_assert_eq!(
                Combination::from_file_name(&combination.status_file_name()).unwrap(),
                combination
            );
        }
    }
}
