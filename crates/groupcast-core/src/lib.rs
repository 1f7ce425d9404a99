//! # groupcast-core
//!
//! The group membership propagation engine: given a directory group id,
//! resolve the group's authoritative membership (recursively flattening
//! nested groups), compare against the mirrored group downstream, and bring
//! the mirror into agreement by creating, overwriting, or deleting it.
//!
//! The crate is transport-free. All I/O goes through the port traits in
//! [`ports`]; HTTP adapters and the event channel live in sibling crates and
//! are injected at construction time.

pub mod crawler;
pub mod error;
pub mod model;
pub mod ports;
pub mod propagator;
pub mod resolver;

pub use crawler::Crawler;
pub use error::{
    CrawlError, DirectoryError, MirrorError, PropagationError, ResolutionError, SinkError,
};
pub use model::{DirectoryGroup, DirectoryMember, MemberKind, MirrorGroup};
pub use ports::{DirectoryPort, MirrorPort, PropagationSink};
pub use propagator::{Propagator, DEFAULT_MIRROR_PREFIX};
pub use resolver::MembershipResolver;
