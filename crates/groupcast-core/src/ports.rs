//! Port contracts connecting the engine to its external collaborators.
//!
//! The engine never talks to a network itself; it is handed implementations
//! of these traits at construction time. Adapters live in their own crates
//! (`groupcast-directory`, `groupcast-mirror`) and the worker binary wires
//! them together.

use async_trait::async_trait;
use std::collections::BTreeSet;

use crate::error::{DirectoryError, MirrorError, SinkError};
use crate::model::{DirectoryGroup, DirectoryMember, MirrorGroup};

/// Read-only access to the upstream directory service.
#[async_trait]
pub trait DirectoryPort: Send + Sync {
    /// Fetch a group by its stable id.
    ///
    /// Absence is reported as [`DirectoryError::NotFound`], which the
    /// propagator treats as a deletion trigger rather than a failure.
    async fn group_by_id(&self, id: &str) -> Result<DirectoryGroup, DirectoryError>;

    /// Fetch a group by its fully qualified name.
    ///
    /// Used at startup to resolve a configured exempt-group name into an id.
    async fn group_by_name(&self, name: &str) -> Result<DirectoryGroup, DirectoryError>;

    /// List all groups matching a name prefix within a folder scope.
    ///
    /// Order is not meaningful.
    async fn groups_by_prefix(
        &self,
        prefix: &str,
        folder: &str,
    ) -> Result<Vec<DirectoryGroup>, DirectoryError>;

    /// Fetch a group's direct member list, which may contain nested groups.
    async fn group_members(&self, name: &str) -> Result<Vec<DirectoryMember>, DirectoryError>;

    /// Ping the service's status endpoint.
    async fn check(&self) -> Result<(), DirectoryError>;
}

/// Read-write access to the downstream mirror service, keyed by mirrored
/// group name.
#[async_trait]
pub trait MirrorPort: Send + Sync {
    /// Fetch the current member set of a mirrored group.
    async fn members(&self, name: &str) -> Result<BTreeSet<String>, MirrorError>;

    /// Create a mirrored group with an initial member set.
    async fn create(
        &self,
        name: &str,
        members: &BTreeSet<String>,
    ) -> Result<MirrorGroup, MirrorError>;

    /// Replace a mirrored group's member set wholesale.
    async fn replace_members(
        &self,
        name: &str,
        members: &BTreeSet<String>,
    ) -> Result<MirrorGroup, MirrorError>;

    /// Delete a mirrored group.
    ///
    /// Deleting a group that does not exist yields
    /// [`MirrorError::NotFound`]; the propagator treats that as success.
    async fn delete(&self, name: &str) -> Result<(), MirrorError>;

    /// Ping the service's status endpoint.
    async fn check(&self) -> Result<(), MirrorError>;
}

/// Outbound channel for fan-out propagation requests.
///
/// The crawler publishes one request per group through this port; the events
/// crate's producer implements it in the worker so the engine stays free of
/// messaging-transport concerns.
#[async_trait]
pub trait PropagationSink: Send + Sync {
    /// Request an asynchronous propagation of one group.
    async fn request_propagation(&self, group_id: &str) -> Result<(), SinkError>;
}
