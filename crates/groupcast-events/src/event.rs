//! Event trait for type-safe publishing and dispatch.

use serde::{de::DeserializeOwned, Serialize};

/// A payload that can travel over the event channel.
///
/// The event type name doubles as the dispatch key on the consuming side and
/// as the routing identifier in failure logs. Convention:
/// `groupcast.<area>.<action>`.
pub trait Event: Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Topic this event is published to and consumed from.
    const TOPIC: &'static str;

    /// Fully qualified event type name stored in the envelope.
    const EVENT_TYPE: &'static str;

    /// Partition key, when events of this type must be ordered relative to
    /// each other. `None` lets the producer fall back to the event id, which
    /// spreads load but guarantees no ordering.
    fn partition_key(&self) -> Option<&str> {
        None
    }
}
