//! Domain model shared by the propagation engine and its ports.

use std::collections::BTreeSet;

/// A group as known to the upstream directory service.
///
/// `id` is the stable key used to derive the mirrored group name; `name` is
/// the key used for member lookups. The two are distinct identifiers and may
/// have nothing in common.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryGroup {
    /// Opaque stable identifier assigned by the directory service.
    pub id: String,
    /// Fully qualified group name (path-like, unique within the directory).
    pub name: String,
    /// Human-readable name, if the directory carries one.
    pub display_name: Option<String>,
    /// Free-form description, if the directory carries one.
    pub description: Option<String>,
}

impl DirectoryGroup {
    /// Convenience constructor for the common id + name case.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            display_name: None,
            description: None,
        }
    }
}

/// Classification of a direct group member, derived from the directory's
/// wire-level source tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MemberKind {
    /// A directly addressable principal (a user account).
    Principal,
    /// A nested group whose own members must be resolved recursively.
    Group,
    /// A member whose source the adapter could not classify. Dropped from
    /// resolution with a diagnostic, never a failure by itself.
    Unrecognized,
}

impl std::fmt::Display for MemberKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MemberKind::Principal => write!(f, "principal"),
            MemberKind::Group => write!(f, "group"),
            MemberKind::Unrecognized => write!(f, "unrecognized"),
        }
    }
}

/// One entry of a group's direct member list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryMember {
    /// Principal identifier (for `Principal`) or group id (for `Group`).
    pub id: String,
    /// Member name; for nested groups this is the name to recurse on.
    pub name: String,
    /// How this member participates in resolution.
    pub kind: MemberKind,
}

impl DirectoryMember {
    pub fn principal(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            kind: MemberKind::Principal,
        }
    }

    pub fn group(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            kind: MemberKind::Group,
        }
    }

    pub fn unrecognized(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            kind: MemberKind::Unrecognized,
        }
    }
}

/// The downstream representation of a propagated group.
///
/// Existence of a mirror group is itself meaningful state; absence is a valid
/// terminal state, not an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MirrorGroup {
    /// Downstream group name, `<prefix><directory group id>`.
    pub name: String,
    /// Current member principal identifiers.
    pub members: BTreeSet<String>,
}

impl MirrorGroup {
    pub fn new(name: impl Into<String>, members: BTreeSet<String>) -> Self {
        Self {
            name: name.into(),
            members,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_member_kind_display() {
        assert_eq!(MemberKind::Principal.to_string(), "principal");
        assert_eq!(MemberKind::Group.to_string(), "group");
        assert_eq!(MemberKind::Unrecognized.to_string(), "unrecognized");
    }

    #[test]
    fn test_member_constructors() {
        let m = DirectoryMember::principal("u1", "alice");
        assert_eq!(m.kind, MemberKind::Principal);

        let g = DirectoryMember::group("g2", "dept:eng");
        assert_eq!(g.kind, MemberKind::Group);
        assert_eq!(g.name, "dept:eng");
    }
}
