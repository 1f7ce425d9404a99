//! Recursive flattening of nested group membership.

use futures::future::BoxFuture;
use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;
use tracing::warn;

use crate::error::{DirectoryError, ResolutionError};
use crate::model::MemberKind;
use crate::ports::DirectoryPort;

/// Flattens a group's membership into a deduplicated set of principal
/// identifiers by recursively expanding nested groups.
///
/// Resolution is all-or-nothing: a fetch failure anywhere in the recursion
/// fails the whole call. Members of unrecognized kind are dropped with a
/// diagnostic and never fail the resolution on their own.
pub struct MembershipResolver {
    directory: Arc<dyn DirectoryPort>,
}

impl MembershipResolver {
    pub fn new(directory: Arc<dyn DirectoryPort>) -> Self {
        Self { directory }
    }

    /// Resolve the full membership of `group_name`.
    ///
    /// Nested groups are expanded depth-first. Each group is expanded at most
    /// once: a group reachable along several non-cyclic paths contributes its
    /// members only the first time (union semantics make the later skips
    /// lossless), while a group that appears on its own expansion chain is a
    /// cycle and fails with [`ResolutionError::CycleDetected`].
    pub async fn resolve(&self, group_name: &str) -> Result<BTreeSet<String>, ResolutionError> {
        let mut principals = BTreeSet::new();
        let mut chain = Vec::new();
        let mut expanded = HashSet::new();
        self.expand(group_name.to_string(), &mut chain, &mut expanded, &mut principals)
            .await?;
        Ok(principals)
    }

    fn expand<'a>(
        &'a self,
        group: String,
        chain: &'a mut Vec<String>,
        expanded: &'a mut HashSet<String>,
        principals: &'a mut BTreeSet<String>,
    ) -> BoxFuture<'a, Result<(), ResolutionError>> {
        Box::pin(async move {
            if chain.iter().any(|ancestor| *ancestor == group) {
                return Err(ResolutionError::CycleDetected { group });
            }
            if !expanded.insert(group.clone()) {
                // Already fully expanded along another path.
                return Ok(());
            }

            let members = self
                .directory
                .group_members(&group)
                .await
                .map_err(|source| wrap_fetch(&group, source))?;

            chain.push(group.clone());
            for member in members {
                match member.kind {
                    MemberKind::Principal => {
                        principals.insert(member.id);
                    }
                    MemberKind::Group => {
                        self.expand(member.name, &mut *chain, &mut *expanded, &mut *principals)
                            .await?;
                    }
                    MemberKind::Unrecognized => {
                        warn!(
                            group = %group,
                            member_id = %member.id,
                            member_name = %member.name,
                            "Dropping member with unrecognized source kind"
                        );
                    }
                }
            }
            chain.pop();
            Ok(())
        })
    }
}

fn wrap_fetch(group: &str, source: DirectoryError) -> ResolutionError {
    ResolutionError::Directory {
        group: group.to_string(),
        source,
    }
}
