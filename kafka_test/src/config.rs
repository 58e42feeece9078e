//! Connection and security settings for the suite
//!
//! Everything is driven by environment variables so the same binary can be
//! pointed at a plaintext, TLS or SASL listener without recompiling:
//!
//! | Variable                            | Default                      |
//! |-------------------------------------|------------------------------|
//! | `BOOTSTRAP_SERVERS`                 | `gateway:19092`              |
//! | `KAFKA_SASL_ENABLED`                | `false`                      |
//! | `KAFKA_SSL_ENABLED`                 | `false`                      |
//! | `KAFKA_SASL_MECHANISM`              | `PLAIN`                      |
//! | `KAFKA_SASL_USERNAME`               | `admin`                      |
//! | `KAFKA_SASL_PASSWORD`               | `admin-secret`               |
//! | `KAFKA_SSL_CA_LOCATION`             | `/etc/kafka/secrets/ca.pem`  |
//! | `KAFKA_SSL_ENDPOINT_IDENTIFICATION` | `none`                       |

use std::env;
use std::fmt;

use rdkafka::config::ClientConfig;

pub const DEFAULT_BOOTSTRAP_SERVERS: &str = "gateway:19092";
pub const DEFAULT_SASL_MECHANISM: &str = "PLAIN";
pub const DEFAULT_SASL_USERNAME: &str = "admin";
pub const DEFAULT_SASL_PASSWORD: &str = "admin-secret";
pub const DEFAULT_SSL_CA_LOCATION: &str = "/etc/kafka/secrets/ca.pem";
pub const DEFAULT_SSL_ENDPOINT_IDENTIFICATION: &str = "none";
pub const DEFAULT_CLIENT_ID_PREFIX: &str = "compat-test";

/// Wire security in effect for every client the suite creates
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SecurityProtocol {
    Plaintext,
    Ssl,
    SaslPlaintext,
    SaslSsl,
}

impl SecurityProtocol {
    pub fn as_str(&self) -> &'static str {
        match self {
            SecurityProtocol::Plaintext => "PLAINTEXT",
            SecurityProtocol::Ssl => "SSL",
            SecurityProtocol::SaslPlaintext => "SASL_PLAINTEXT",
            SecurityProtocol::SaslSsl => "SASL_SSL",
        }
    }
}

impl fmt::Display for SecurityProtocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, PartialEq, Eq)]
pub struct SecurityConfig {
    pub sasl_enabled: bool,
    pub ssl_enabled: bool,
    pub sasl_mechanism: String,
    pub sasl_username: String,
    pub sasl_password: String,
    pub ssl_ca_location: String,
    pub ssl_endpoint_identification: String,
}

impl fmt::Debug for SecurityConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecurityConfig")
            .field("protocol", &self.protocol())
            .field("sasl_mechanism", &self.sasl_mechanism)
            // REDACT credentials to keep them out of logs
            .field("sasl_username", &"[REDACTED]")
            .field("sasl_password", &"[REDACTED]")
            .field("ssl_ca_location", &self.ssl_ca_location)
            .field("ssl_endpoint_identification", &self.ssl_endpoint_identification)
            .finish()
    }
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            sasl_enabled: false,
            ssl_enabled: false,
            sasl_mechanism: DEFAULT_SASL_MECHANISM.to_string(),
            sasl_username: DEFAULT_SASL_USERNAME.to_string(),
            sasl_password: DEFAULT_SASL_PASSWORD.to_string(),
            ssl_ca_location: DEFAULT_SSL_CA_LOCATION.to_string(),
            ssl_endpoint_identification: DEFAULT_SSL_ENDPOINT_IDENTIFICATION.to_string(),
        }
    }
}

impl SecurityConfig {
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let flag = |key: &str| {
            lookup(key)
                .map(|v| v.trim().eq_ignore_ascii_case("true"))
                .unwrap_or(false)
        };
        let text = |key: &str, default: &str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| default.to_string())
        };

        Self {
            sasl_enabled: flag("KAFKA_SASL_ENABLED"),
            ssl_enabled: flag("KAFKA_SSL_ENABLED"),
            sasl_mechanism: text("KAFKA_SASL_MECHANISM", DEFAULT_SASL_MECHANISM),
            sasl_username: text("KAFKA_SASL_USERNAME", DEFAULT_SASL_USERNAME),
            sasl_password: text("KAFKA_SASL_PASSWORD", DEFAULT_SASL_PASSWORD),
            ssl_ca_location: text("KAFKA_SSL_CA_LOCATION", DEFAULT_SSL_CA_LOCATION),
            ssl_endpoint_identification: text(
                "KAFKA_SSL_ENDPOINT_IDENTIFICATION",
                DEFAULT_SSL_ENDPOINT_IDENTIFICATION,
            ),
        }
    }

    pub fn protocol(&self) -> SecurityProtocol {
        match (self.sasl_enabled, self.ssl_enabled) {
            (true, true) => SecurityProtocol::SaslSsl,
            (true, false) => SecurityProtocol::SaslPlaintext,
            (false, true) => SecurityProtocol::Ssl,
            (false, false) => SecurityProtocol::Plaintext,
        }
    }

    /// Client properties implied by these settings
    pub fn properties(&self) -> Vec<(&'static str, String)> {
        let protocol = self.protocol();
        let mut props = vec![("security.protocol", protocol.as_str().to_string())];

        if self.ssl_enabled {
            props.push(("ssl.ca.location", self.ssl_ca_location.clone()));
            props.push((
                "ssl.endpoint.identification.algorithm",
                self.ssl_endpoint_identification.clone(),
            ));
        }

        if self.sasl_enabled {
            props.push(("sasl.mechanism", self.sasl_mechanism.clone()));
            props.push(("sasl.username", self.sasl_username.clone()));
            props.push(("sasl.password", self.sasl_password.clone()));
        }

        props
    }

    pub fn apply(&self, config: &mut ClientConfig) {
        for (key, value) in self.properties() {
            config.set(key, value);
        }
    }
}

/// Everything a scenario needs to reach the cluster
#[derive(Clone, Debug)]
pub struct SuiteConfig {
    pub bootstrap_servers: String,
    pub security: SecurityConfig,
    pub client_id_prefix: String,
}

impl SuiteConfig {
    /// Positional argument wins, then `BOOTSTRAP_SERVERS`, then the default
    pub fn new(bootstrap_arg: Option<String>) -> Self {
        Self::from_lookup(bootstrap_arg, |key| env::var(key).ok())
    }

    pub fn from_lookup<F>(bootstrap_arg: Option<String>, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let bootstrap_servers = bootstrap_arg
            .filter(|v| !v.trim().is_empty())
            .or_else(|| lookup("BOOTSTRAP_SERVERS").filter(|v| !v.trim().is_empty()))
            .unwrap_or_else(|| DEFAULT_BOOTSTRAP_SERVERS.to_string());

        Self {
            bootstrap_servers,
            security: SecurityConfig::from_lookup(&lookup),
            client_id_prefix: DEFAULT_CLIENT_ID_PREFIX.to_string(),
        }
    }

    /// Base client config with bootstrap, client id and security applied
    pub fn client_config(&self, role: &str) -> ClientConfig {
        let mut config = ClientConfig::new();
        config
            .set("bootstrap.servers", &self.bootstrap_servers)
            .set("client.id", format!("{}-{}", self.client_id_prefix, role));
        self.security.apply(&mut config);
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_plaintext_by_default() {
        let security = SecurityConfig::from_lookup(lookup_from(&[]));
        assert_eq!(security.protocol(), SecurityProtocol::Plaintext);
        assert_eq!(
            security.properties(),
            vec![("security.protocol", "PLAINTEXT".to_string())]
        );
    }

    #[test]
    fn test_ssl_only() {
        let security = SecurityConfig::from_lookup(lookup_from(&[("KAFKA_SSL_ENABLED", "TRUE")]));
        let props = security.properties();
        assert_eq!(security.protocol(), SecurityProtocol::Ssl);
        assert!(props.contains(&("ssl.ca.location", DEFAULT_SSL_CA_LOCATION.to_string())));
        assert!(props.contains(&("ssl.endpoint.identification.algorithm", "none".to_string())));
        assert!(!props.iter().any(|(k, _)| k.starts_with("sasl.")));
    }

    #[test]
    fn test_sasl_defaults() {
        let security = SecurityConfig::from_lookup(lookup_from(&[("KAFKA_SASL_ENABLED", "true")]));
        let props = security.properties();
        assert_eq!(security.protocol(), SecurityProtocol::SaslPlaintext);
        assert!(props.contains(&("sasl.mechanism", "PLAIN".to_string())));
        assert!(props.contains(&("sasl.username", "admin".to_string())));
        assert!(props.contains(&("sasl.password", "admin-secret".to_string())));
    }

    #[test]
    fn test_sasl_over_ssl() {
        let security = SecurityConfig::from_lookup(lookup_from(&[
            ("KAFKA_SASL_ENABLED", "true"),
            ("KAFKA_SSL_ENABLED", "true"),
            ("KAFKA_SASL_MECHANISM", "SCRAM-SHA-512"),
        ]));
        assert_eq!(security.protocol(), SecurityProtocol::SaslSsl);
        assert!(security
            .properties()
            .contains(&("sasl.mechanism", "SCRAM-SHA-512".to_string())));
    }

    #[test]
    fn test_non_true_values_are_false() {
        let security = SecurityConfig::from_lookup(lookup_from(&[
            ("KAFKA_SASL_ENABLED", "yes"),
            ("KAFKA_SSL_ENABLED", "1"),
        ]));
        assert_eq!(security.protocol(), SecurityProtocol::Plaintext);
    }

    #[test]
    fn test_debug_redacts_credentials() {
        let security = SecurityConfig::from_lookup(lookup_from(&[
            ("KAFKA_SASL_USERNAME", "alice"),
            ("KAFKA_SASL_PASSWORD", "hunter2"),
        ]));
        let debug = format!("{:?}", security);
        assert!(!debug.contains("alice"));
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn test_bootstrap_precedence() {
        let env = lookup_from(&[("BOOTSTRAP_SERVERS", "env:9092")]);
        assert_eq!(
            SuiteConfig::from_lookup(Some("arg:9092".into()), &env).bootstrap_servers,
            "arg:9092"
        );
        assert_eq!(SuiteConfig::from_lookup(None, &env).bootstrap_servers, "env:9092");
        assert_eq!(
            SuiteConfig::from_lookup(None, lookup_from(&[])).bootstrap_servers,
            DEFAULT_BOOTSTRAP_SERVERS
        );
    }
}
