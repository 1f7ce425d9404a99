//! The event vocabulary of the propagation service.

use serde::{Deserialize, Serialize};

use crate::event::Event;

/// Request a full-namespace crawl: one propagation request will be fanned out
/// per directory group found.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RefreshAll {}

impl Event for RefreshAll {
    const TOPIC: &'static str = "groupcast.sync.refresh";
    const EVENT_TYPE: &'static str = "groupcast.sync.refresh";
}

/// Request propagation of a single directory group.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PropagateGroup {
    /// Stable directory id of the group to propagate.
    pub group_id: String,
}

impl PropagateGroup {
    pub fn new(group_id: impl Into<String>) -> Self {
        Self {
            group_id: group_id.into(),
        }
    }
}

impl Event for PropagateGroup {
    const TOPIC: &'static str = "groupcast.sync.group";
    const EVENT_TYPE: &'static str = "groupcast.sync.group";

    /// Propagations for the same group are keyed together so redeliveries
    /// and bursts for one group stay ordered on a single partition.
    fn partition_key(&self) -> Option<&str> {
        Some(&self.group_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_propagate_group_partition_key() {
        let event = PropagateGroup::new("g1");
        assert_eq!(event.partition_key(), Some("g1"));
    }

    #[test]
    fn test_refresh_all_has_no_partition_key() {
        assert_eq!(RefreshAll::default().partition_key(), None);
    }

    #[test]
    fn test_event_serialization_shapes() {
        let json = serde_json::to_value(PropagateGroup::new("g1")).unwrap();
        assert_eq!(json, serde_json::json!({"group_id": "g1"}));

        let json = serde_json::to_value(RefreshAll {}).unwrap();
        assert_eq!(json, serde_json::json!({}));
    }
}
