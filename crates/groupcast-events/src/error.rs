//! Error types for the event channel.

use thiserror::Error;
use uuid::Uuid;

/// Errors that can occur while talking to the broker or handling events.
#[derive(Debug, Error)]
pub enum EventError {
    /// Required configuration variable is missing.
    #[error("configuration missing: {var}")]
    ConfigMissing { var: String },

    /// Configuration value is invalid.
    #[error("configuration invalid for {var}: {reason}")]
    ConfigInvalid { var: String, reason: String },

    /// Failed to reach the broker.
    #[error("connection to broker {broker} failed: {cause}")]
    ConnectionFailed { broker: String, cause: String },

    /// Failed to publish an event.
    #[error("publishing to topic {topic} failed: {cause}")]
    PublishFailed { topic: String, cause: String },

    /// Failed to serialize an event for publishing.
    #[error("serializing event {event_type} failed: {cause}")]
    SerializationFailed { event_type: String, cause: String },

    /// Failed to consume from a topic.
    #[error("consuming from {topic} failed: {cause}")]
    ConsumeFailed { topic: String, cause: String },

    /// The message is not a valid envelope.
    #[error("invalid event envelope: {reason}")]
    InvalidEnvelope { reason: String },

    /// The envelope's payload does not match its declared event type.
    #[error("decoding payload of event {event_id} ({event_type}) failed: {cause}")]
    PayloadMismatch {
        event_id: Uuid,
        event_type: String,
        cause: String,
    },

    /// Underlying Kafka client error.
    #[error("kafka error: {0}")]
    Kafka(#[from] rdkafka::error::KafkaError),
}

impl EventError {
    /// True when the error is a temporary broker condition worth retrying.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            EventError::ConnectionFailed { .. }
                | EventError::PublishFailed { .. }
                | EventError::ConsumeFailed { .. }
                | EventError::Kafka(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        let transient = EventError::PublishFailed {
            topic: "groupcast.sync.group".into(),
            cause: "broker down".into(),
        };
        assert!(transient.is_transient());

        let permanent = EventError::ConfigMissing {
            var: "KAFKA_BOOTSTRAP_SERVERS".into(),
        };
        assert!(!permanent.is_transient());

        let mismatch = EventError::PayloadMismatch {
            event_id: Uuid::nil(),
            event_type: "groupcast.sync.group".into(),
            cause: "missing field".into(),
        };
        assert!(!mismatch.is_transient());
    }

    #[test]
    fn test_error_display() {
        let err = EventError::ConfigMissing {
            var: "KAFKA_BOOTSTRAP_SERVERS".into(),
        };
        assert_eq!(
            err.to_string(),
            "configuration missing: KAFKA_BOOTSTRAP_SERVERS"
        );
    }
}
