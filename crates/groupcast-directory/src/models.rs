//! Wire models for the directory service's REST API.

use serde::{Deserialize, Serialize};

use groupcast_core::model::{DirectoryGroup, DirectoryMember, MemberKind};

/// Source tag the directory uses for directly addressable principals.
pub const SOURCE_PRINCIPAL: &str = "ldap";
/// Source tag the directory uses for groups that are members of groups.
pub const SOURCE_NESTED_GROUP: &str = "g:gsa";

/// A group record as the directory serves it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WireGroup {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub extension: Option<String>,
}

impl From<WireGroup> for DirectoryGroup {
    fn from(wire: WireGroup) -> Self {
        DirectoryGroup {
            id: wire.id,
            name: wire.name,
            display_name: wire.display_name,
            description: wire.description,
        }
    }
}

/// Listing response: `GET /groups?search=...`.
#[derive(Debug, Clone, Deserialize)]
pub struct WireGroupList {
    #[serde(default)]
    pub groups: Vec<WireGroup>,
}

/// One subject in a group's direct member list.
#[derive(Debug, Clone, Deserialize)]
pub struct WireSubject {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub source_id: String,
    #[serde(default)]
    pub email: Option<String>,
}

impl WireSubject {
    /// Classify this subject by its source tag.
    #[must_use]
    pub fn kind(&self) -> MemberKind {
        match self.source_id.as_str() {
            SOURCE_PRINCIPAL => MemberKind::Principal,
            SOURCE_NESTED_GROUP => MemberKind::Group,
            _ => MemberKind::Unrecognized,
        }
    }
}

impl From<WireSubject> for DirectoryMember {
    fn from(wire: WireSubject) -> Self {
        let kind = wire.kind();
        DirectoryMember {
            id: wire.id,
            name: wire.name,
            kind,
        }
    }
}

/// Member-list response: `GET /groups/{name}/members`.
#[derive(Debug, Clone, Deserialize)]
pub struct WireMemberList {
    #[serde(default)]
    pub members: Vec<WireSubject>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subject_kind_classification() {
        let principal: WireSubject = serde_json::from_value(serde_json::json!({
            "id": "alice", "name": "alice", "source_id": "ldap"
        }))
        .unwrap();
        assert_eq!(principal.kind(), MemberKind::Principal);

        let nested: WireSubject = serde_json::from_value(serde_json::json!({
            "id": "id-g2", "name": "org:g2", "source_id": "g:gsa"
        }))
        .unwrap();
        assert_eq!(nested.kind(), MemberKind::Group);

        let odd: WireSubject = serde_json::from_value(serde_json::json!({
            "id": "app", "name": "app", "source_id": "g:isa"
        }))
        .unwrap();
        assert_eq!(odd.kind(), MemberKind::Unrecognized);
    }

    #[test]
    fn test_group_conversion_keeps_display_metadata() {
        let wire: WireGroup = serde_json::from_value(serde_json::json!({
            "id": "g1",
            "name": "org:g1",
            "display_name": "Group One",
            "description": "first group",
            "extension": "g1"
        }))
        .unwrap();
        let group: DirectoryGroup = wire.into();
        assert_eq!(group.display_name.as_deref(), Some("Group One"));
        assert_eq!(group.description.as_deref(), Some("first group"));
    }

    #[test]
    fn test_member_list_defaults_to_empty() {
        let list: WireMemberList = serde_json::from_str("{}").unwrap();
        assert!(list.members.is_empty());
    }
}
