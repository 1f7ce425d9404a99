//! Envelope wrapping every event with identity and routing metadata.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::EventError;
use crate::event::Event;

/// JSON wrapper around every event on the channel.
///
/// `event_id` is the duplicate-suppression key; `event_type` is the dispatch
/// key and the routing identifier that failure logs carry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventEnvelope<T> {
    pub event_id: Uuid,
    pub event_type: String,
    pub timestamp: DateTime<Utc>,
    pub payload: T,
}

impl<T: Event> EventEnvelope<T> {
    /// Wrap a payload with a fresh event id.
    pub fn new(payload: T) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            event_type: T::EVENT_TYPE.to_string(),
            timestamp: Utc::now(),
            payload,
        }
    }

    /// Wrap a payload with a caller-chosen event id (tests, replays).
    pub fn with_id(event_id: Uuid, payload: T) -> Self {
        Self {
            event_id,
            event_type: T::EVENT_TYPE.to_string(),
            timestamp: Utc::now(),
            payload,
        }
    }

    /// Kafka message key: the payload's partition key when it has one,
    /// otherwise the event id.
    #[must_use]
    pub fn message_key(&self) -> String {
        self.payload
            .partition_key()
            .map_or_else(|| self.event_id.to_string(), ToString::to_string)
    }

    /// Serialize for publishing.
    pub fn to_json_bytes(&self) -> Result<Vec<u8>, EventError> {
        serde_json::to_vec(self).map_err(|e| EventError::SerializationFailed {
            event_type: T::EVENT_TYPE.to_string(),
            cause: e.to_string(),
        })
    }
}

/// Envelope with the payload left undecoded, for dispatch by event type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawEnvelope {
    pub event_id: Uuid,
    pub event_type: String,
    pub timestamp: DateTime<Utc>,
    pub payload: serde_json::Value,
}

impl RawEnvelope {
    /// Parse an envelope from raw message bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, EventError> {
        serde_json::from_slice(bytes).map_err(|e| EventError::InvalidEnvelope {
            reason: e.to_string(),
        })
    }

    /// Reject envelopes that do not follow the naming convention; they were
    /// not produced by this system.
    pub fn validate(&self) -> Result<(), EventError> {
        if self.event_type.is_empty() {
            return Err(EventError::InvalidEnvelope {
                reason: "event_type is empty".into(),
            });
        }
        if !self.event_type.starts_with("groupcast.") {
            return Err(EventError::InvalidEnvelope {
                reason: format!("event_type '{}' is not a groupcast event", self.event_type),
            });
        }
        Ok(())
    }

    /// Decode the payload into a concrete event type.
    pub fn decode_payload<E: Event>(&self) -> Result<E, EventError> {
        serde_json::from_value(self.payload.clone()).map_err(|e| EventError::PayloadMismatch {
            event_id: self.event_id,
            event_type: self.event_type.clone(),
            cause: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{PropagateGroup, RefreshAll};

    #[test]
    fn test_envelope_roundtrip() {
        let envelope = EventEnvelope::new(PropagateGroup::new("g1"));
        let bytes = envelope.to_json_bytes().unwrap();
        let raw = RawEnvelope::from_bytes(&bytes).unwrap();

        assert_eq!(raw.event_id, envelope.event_id);
        assert_eq!(raw.event_type, "groupcast.sync.group");
        let decoded: PropagateGroup = raw.decode_payload().unwrap();
        assert_eq!(decoded.group_id, "g1");
    }

    #[test]
    fn test_message_key_prefers_partition_key() {
        let envelope = EventEnvelope::new(PropagateGroup::new("g1"));
        assert_eq!(envelope.message_key(), "g1");

        let envelope = EventEnvelope::new(RefreshAll {});
        assert_eq!(envelope.message_key(), envelope.event_id.to_string());
    }

    #[test]
    fn test_validation_rejects_foreign_events() {
        let raw = RawEnvelope {
            event_id: Uuid::new_v4(),
            event_type: "billing.invoice.created".into(),
            timestamp: Utc::now(),
            payload: serde_json::json!({}),
        };
        assert!(raw.validate().is_err());

        let raw = RawEnvelope {
            event_type: "groupcast.sync.refresh".into(),
            ..raw
        };
        assert!(raw.validate().is_ok());
    }

    #[test]
    fn test_decode_payload_mismatch() {
        let raw = RawEnvelope {
            event_id: Uuid::new_v4(),
            event_type: "groupcast.sync.group".into(),
            timestamp: Utc::now(),
            payload: serde_json::json!({"wrong_field": 1}),
        };
        let err = raw.decode_payload::<PropagateGroup>().unwrap_err();
        assert!(matches!(err, EventError::PayloadMismatch { .. }));
    }
}
