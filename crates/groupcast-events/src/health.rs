//! Broker health probe result.

use serde::{Deserialize, Serialize};

/// Snapshot of broker connectivity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthStatus {
    /// Whether metadata could be fetched.
    pub connected: bool,
    /// Number of brokers discovered.
    pub brokers: usize,
    /// Number of topics discovered.
    pub topics: usize,
}

impl HealthStatus {
    #[must_use]
    pub fn is_healthy(&self) -> bool {
        self.connected && self.brokers > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_healthy_requires_brokers() {
        let healthy = HealthStatus {
            connected: true,
            brokers: 3,
            topics: 2,
        };
        assert!(healthy.is_healthy());

        let no_brokers = HealthStatus {
            connected: true,
            brokers: 0,
            topics: 0,
        };
        assert!(!no_brokers.is_healthy());
    }
}
