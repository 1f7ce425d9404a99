//! The propagation engine: reconciles one mirrored group with upstream truth.

use std::sync::Arc;
use tracing::{debug, info};

use crate::error::{DirectoryError, MirrorError, PropagationError};
use crate::ports::{DirectoryPort, MirrorPort};
use crate::resolver::MembershipResolver;

/// Default prefix for derived mirror group names.
pub const DEFAULT_MIRROR_PREFIX: &str = "@dir-";

/// Propagates a directory group's membership to the mirror service.
///
/// Each invocation computes the full desired state from scratch: fetch the
/// group, flatten its membership, probe the mirror, then create, overwrite,
/// or delete. Nothing is cached between invocations and the final write is a
/// full replace, which is what makes concurrent same-group propagations and
/// message redelivery safe (last writer wins).
pub struct Propagator {
    directory: Arc<dyn DirectoryPort>,
    mirror: Arc<dyn MirrorPort>,
    resolver: MembershipResolver,
    mirror_prefix: String,
    exempt_group_id: String,
}

impl Propagator {
    /// Create a propagator.
    ///
    /// An empty `mirror_prefix` falls back to [`DEFAULT_MIRROR_PREFIX`].
    /// `exempt_group_id` names the directory-wide public group that must
    /// never be mirrored.
    pub fn new(
        directory: Arc<dyn DirectoryPort>,
        mirror: Arc<dyn MirrorPort>,
        mirror_prefix: impl Into<String>,
        exempt_group_id: impl Into<String>,
    ) -> Self {
        let mut mirror_prefix = mirror_prefix.into();
        if mirror_prefix.is_empty() {
            mirror_prefix = DEFAULT_MIRROR_PREFIX.to_string();
        }
        Self {
            resolver: MembershipResolver::new(directory.clone()),
            directory,
            mirror,
            mirror_prefix,
            exempt_group_id: exempt_group_id.into(),
        }
    }

    /// The mirror-side name derived for a directory group id.
    #[must_use]
    pub fn mirror_name(&self, group_id: &str) -> String {
        format!("{}{}", self.mirror_prefix, group_id)
    }

    /// Bring the mirrored group for `group_id` into agreement with the
    /// directory.
    ///
    /// Idempotent: repeating the call with no intervening upstream change
    /// leaves the same final mirrored state and succeeds again.
    pub async fn propagate(&self, group_id: &str) -> Result<(), PropagationError> {
        if group_id == self.exempt_group_id {
            info!(group_id, "Skipping propagation request for the exempt public group");
            return Ok(());
        }

        let mirror_name = self.mirror_name(group_id);

        let group = match self.directory.group_by_id(group_id).await {
            Ok(group) => group,
            Err(DirectoryError::NotFound(_)) => {
                return self.delete_mirror(group_id, &mirror_name).await;
            }
            Err(source) => {
                return Err(PropagationError::UpstreamUnavailable {
                    operation: "fetch group",
                    group_id: group_id.to_string(),
                    source,
                });
            }
        };

        if group.id != group_id {
            return Err(PropagationError::IdentityMismatch {
                requested: group_id.to_string(),
                fetched: group.id,
            });
        }

        let members = self.resolver.resolve(&group.name).await.map_err(|source| {
            PropagationError::ResolutionFailed {
                group_id: group_id.to_string(),
                group_name: group.name.clone(),
                source,
            }
        })?;

        // Probe first: the mirror's create and update verbs take different
        // payload shapes, so existence has to be known before writing. The
        // current member content is irrelevant; the write is a full replace
        // either way.
        let exists = match self.mirror.members(&mirror_name).await {
            Ok(_) => true,
            Err(MirrorError::NotFound(_)) => false,
            Err(source) => {
                return Err(PropagationError::MirrorUnavailable {
                    operation: "probe",
                    mirror_name,
                    source,
                });
            }
        };

        let written = if exists {
            self.mirror
                .replace_members(&mirror_name, &members)
                .await
                .map_err(|source| PropagationError::MirrorUnavailable {
                    operation: "replace members",
                    mirror_name: mirror_name.clone(),
                    source,
                })?
        } else {
            self.mirror
                .create(&mirror_name, &members)
                .await
                .map_err(|source| PropagationError::MirrorUnavailable {
                    operation: "create",
                    mirror_name: mirror_name.clone(),
                    source,
                })?
        };

        info!(
            group_id,
            group_name = %group.name,
            mirror_name = %written.name,
            member_count = written.members.len(),
            created = !exists,
            "Propagated group membership"
        );
        Ok(())
    }

    /// Remove the mirrored group for an upstream group that no longer
    /// exists. Absence of the mirrored group is success, not failure.
    async fn delete_mirror(
        &self,
        group_id: &str,
        mirror_name: &str,
    ) -> Result<(), PropagationError> {
        match self.mirror.delete(mirror_name).await {
            Ok(()) => {
                info!(group_id, mirror_name, "Deleted mirror of vanished directory group");
                Ok(())
            }
            Err(MirrorError::NotFound(_)) => {
                debug!(group_id, mirror_name, "Mirror group already absent");
                Ok(())
            }
            Err(source) => Err(PropagationError::MirrorUnavailable {
                operation: "delete",
                mirror_name: mirror_name.to_string(),
                source,
            }),
        }
    }
}
