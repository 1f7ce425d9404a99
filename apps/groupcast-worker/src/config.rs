//! Worker configuration loaded from environment variables.
//!
//! Loading is fail-fast and reports every missing required variable at once,
//! so a misconfigured deployment shows the whole problem in one log line.

use std::env;
use std::time::Duration;
use thiserror::Error;

use groupcast_events::{EventError, KafkaConfig};

/// Default prefix for derived mirror group names.
const DEFAULT_MIRROR_PREFIX: &str = "@dir-";

/// Default per-request HTTP timeout in seconds.
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("configuration variables must be set: {}", vars.join(", "))]
    Missing { vars: Vec<String> },

    #[error("configuration invalid for {var}: {reason}")]
    Invalid { var: String, reason: String },

    #[error(transparent)]
    Events(#[from] EventError),
}

/// How the exempt public group is identified in configuration.
///
/// The deployment can give either the directory id directly or the group's
/// name; a name is resolved to an id at startup through the directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExemptGroup {
    Id(String),
    Name(String),
}

/// Settings for the directory and mirror sides plus the engine itself.
#[derive(Debug, Clone)]
pub struct WorkerSettings {
    /// Base URL of the upstream directory service.
    pub directory_base_url: String,
    /// Acting user for directory requests.
    pub directory_user: String,
    /// Namespace (name prefix / folder scope) crawled on full resync.
    pub directory_namespace: String,
    /// The directory-wide public group that is never mirrored.
    pub exempt_group: ExemptGroup,

    /// Base URL of the downstream mirror service.
    pub mirror_base_url: String,
    /// Acting user for mirror requests.
    pub mirror_user: String,
    /// Prefix for derived mirror group names.
    pub mirror_group_prefix: String,

    /// Per-request HTTP timeout.
    pub http_timeout: Duration,
    /// Log filter directive, e.g. `info,groupcast_core=debug`.
    pub log_filter: String,
}

impl WorkerSettings {
    /// Build settings from a variable lookup, collecting all missing
    /// required names before failing.
    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut missing = Vec::new();
        let mut require = |var: &str| match lookup(var) {
            Some(value) if !value.is_empty() => Some(value),
            _ => {
                missing.push(var.to_string());
                None
            }
        };

        let directory_base_url = require("DIRECTORY_BASE_URL");
        let directory_user = require("DIRECTORY_USER");
        let directory_namespace = require("DIRECTORY_NAMESPACE");
        let mirror_base_url = require("MIRROR_BASE_URL");
        let mirror_user = require("MIRROR_USER");

        let exempt_group = match (
            lookup("DIRECTORY_EXEMPT_GROUP_ID"),
            lookup("DIRECTORY_EXEMPT_GROUP_NAME"),
        ) {
            (Some(id), _) if !id.is_empty() => Some(ExemptGroup::Id(id)),
            (_, Some(name)) if !name.is_empty() => Some(ExemptGroup::Name(name)),
            _ => {
                missing.push("DIRECTORY_EXEMPT_GROUP_ID or DIRECTORY_EXEMPT_GROUP_NAME".into());
                None
            }
        };

        if !missing.is_empty() {
            return Err(ConfigError::Missing { vars: missing });
        }

        let http_timeout = match lookup("HTTP_TIMEOUT_SECS") {
            Some(value) => {
                let secs: u64 = value.parse().map_err(|_| ConfigError::Invalid {
                    var: "HTTP_TIMEOUT_SECS".into(),
                    reason: format!("not a number of seconds: {value}"),
                })?;
                Duration::from_secs(secs)
            }
            None => Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
        };

        Ok(Self {
            directory_base_url: directory_base_url.unwrap(),
            directory_user: directory_user.unwrap(),
            directory_namespace: directory_namespace.unwrap(),
            exempt_group: exempt_group.unwrap(),
            mirror_base_url: mirror_base_url.unwrap(),
            mirror_user: mirror_user.unwrap(),
            mirror_group_prefix: lookup("MIRROR_GROUP_PREFIX")
                .filter(|p| !p.is_empty())
                .unwrap_or_else(|| DEFAULT_MIRROR_PREFIX.to_string()),
            http_timeout,
            log_filter: lookup("RUST_LOG").unwrap_or_else(|| "info".to_string()),
        })
    }
}

/// Complete worker configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub worker: WorkerSettings,
    pub kafka: KafkaConfig,
}

impl Config {
    /// Load everything from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        let worker = WorkerSettings::from_lookup(|var| env::var(var).ok())?;
        let kafka = KafkaConfig::from_env()?;
        Ok(Self { worker, kafka })
    }
}
