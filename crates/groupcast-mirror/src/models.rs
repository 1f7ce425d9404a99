//! Wire models for the mirror service's group API.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use groupcast_core::model::MirrorGroup;

/// Group payload as the mirror sends and receives it.
///
/// Create takes a name and members; replace takes members only. Serialization
/// skips the name when absent so one model covers both shapes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WireMirrorGroup {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub members: Vec<String>,
}

impl WireMirrorGroup {
    pub fn create_payload(name: &str, members: &BTreeSet<String>) -> Self {
        Self {
            name: Some(name.to_string()),
            members: members.iter().cloned().collect(),
        }
    }

    pub fn replace_payload(members: &BTreeSet<String>) -> Self {
        Self {
            name: None,
            members: members.iter().cloned().collect(),
        }
    }

    /// Convert a response into the domain model, filling in the requested
    /// name when the service omits it.
    #[must_use]
    pub fn into_group(self, requested_name: &str) -> MirrorGroup {
        MirrorGroup {
            name: self.name.unwrap_or_else(|| requested_name.to_string()),
            members: self.members.into_iter().collect(),
        }
    }
}

/// Error body the mirror attaches to non-success responses.
#[derive(Debug, Clone, Deserialize)]
pub struct WireServiceError {
    #[serde(default)]
    pub error_code: Option<String>,
    #[serde(default)]
    pub reason: Option<String>,
}
