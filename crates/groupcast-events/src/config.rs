//! Broker configuration.

use std::env;
use std::str::FromStr;

use crate::error::EventError;

/// Security protocol for the broker connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecurityProtocol {
    /// Plaintext connection.
    Plaintext,
    /// TLS-encrypted connection.
    Ssl,
}

impl FromStr for SecurityProtocol {
    type Err = EventError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "PLAINTEXT" => Ok(Self::Plaintext),
            "SSL" => Ok(Self::Ssl),
            _ => Err(EventError::ConfigInvalid {
                var: "KAFKA_SECURITY_PROTOCOL".into(),
                reason: format!("unknown protocol: {s}"),
            }),
        }
    }
}

impl SecurityProtocol {
    /// The rdkafka configuration value.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Plaintext => "PLAINTEXT",
            Self::Ssl => "SSL",
        }
    }
}

/// Kafka connection settings shared by producer and consumer.
#[derive(Debug, Clone)]
pub struct KafkaConfig {
    /// Comma-separated broker addresses.
    pub bootstrap_servers: String,
    /// Client identifier reported to the broker.
    pub client_id: String,
    /// Security protocol.
    pub security_protocol: SecurityProtocol,
    /// Optional prefix for consumer group ids, so several deployments can
    /// share one broker without stealing each other's messages.
    pub group_prefix: Option<String>,
}

impl KafkaConfig {
    /// Load configuration from environment variables.
    ///
    /// Required: `KAFKA_BOOTSTRAP_SERVERS`.
    /// Optional: `KAFKA_CLIENT_ID` (default `groupcast`),
    /// `KAFKA_SECURITY_PROTOCOL` (`PLAINTEXT` default, or `SSL`),
    /// `KAFKA_GROUP_PREFIX`.
    pub fn from_env() -> Result<Self, EventError> {
        let bootstrap_servers =
            env::var("KAFKA_BOOTSTRAP_SERVERS").map_err(|_| EventError::ConfigMissing {
                var: "KAFKA_BOOTSTRAP_SERVERS".into(),
            })?;

        let security_protocol = match env::var("KAFKA_SECURITY_PROTOCOL") {
            Ok(value) => value.parse()?,
            Err(_) => SecurityProtocol::Plaintext,
        };

        let client_id = env::var("KAFKA_CLIENT_ID").unwrap_or_else(|_| "groupcast".to_string());
        let group_prefix = env::var("KAFKA_GROUP_PREFIX").ok().filter(|p| !p.is_empty());

        Ok(Self {
            bootstrap_servers,
            client_id,
            security_protocol,
            group_prefix,
        })
    }

    /// Consumer group id for a service, with the deployment prefix applied.
    #[must_use]
    pub fn consumer_group(&self, service: &str) -> String {
        match &self.group_prefix {
            Some(prefix) => format!("{prefix}.{service}"),
            None => service.to_string(),
        }
    }
}
