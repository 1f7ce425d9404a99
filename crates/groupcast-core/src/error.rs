//! Error taxonomy for the propagation engine.
//!
//! Errors are classified transient/fatal so the message-channel adapter can
//! translate a propagation result into acknowledge or redeliver without
//! knowing anything about directories or mirrors.

use thiserror::Error;

/// Errors surfaced by a [`crate::ports::DirectoryPort`] implementation.
///
/// `NotFound` is a logical outcome, not an exceptional one: the propagator
/// branches on it to drive mirror deletion.
#[derive(Debug, Error)]
pub enum DirectoryError {
    /// The requested group does not exist upstream.
    #[error("directory group not found: {0}")]
    NotFound(String),

    /// The request never completed (connect failure, timeout, protocol error).
    #[error("directory {operation} for {target} failed: {message}")]
    Transport {
        operation: &'static str,
        target: String,
        message: String,
    },

    /// The directory answered with a status outside the success range.
    #[error("directory {operation} for {target} returned status {status}")]
    UnexpectedStatus {
        operation: &'static str,
        target: String,
        status: u16,
    },

    /// The response body could not be decoded.
    #[error("decoding directory {operation} response for {target} failed: {message}")]
    Decode {
        operation: &'static str,
        target: String,
        message: String,
    },
}

impl DirectoryError {
    /// True when the error denotes absence rather than failure.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, DirectoryError::NotFound(_))
    }
}

/// Errors surfaced by a [`crate::ports::MirrorPort`] implementation.
#[derive(Debug, Error)]
pub enum MirrorError {
    /// The mirrored group does not exist downstream.
    ///
    /// The mirror service signals this through an application-level error
    /// code rather than a dedicated transport status; adapters are required
    /// to translate that code into this variant.
    #[error("mirror group not found: {0}")]
    NotFound(String),

    /// The request never completed.
    #[error("mirror {operation} for {target} failed: {message}")]
    Transport {
        operation: &'static str,
        target: String,
        message: String,
    },

    /// The mirror rejected the request with an application error.
    #[error("mirror {operation} for {target} returned status {status} ({})",
        .code.as_deref().unwrap_or("no error code"))]
    Api {
        operation: &'static str,
        target: String,
        status: u16,
        code: Option<String>,
    },

    /// The response body could not be decoded.
    #[error("decoding mirror {operation} response for {target} failed: {message}")]
    Decode {
        operation: &'static str,
        target: String,
        message: String,
    },
}

impl MirrorError {
    /// True when the error denotes absence rather than failure.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, MirrorError::NotFound(_))
    }
}

/// Failure of a recursive membership resolution.
///
/// Resolution is all-or-nothing: any failure anywhere in the recursion fails
/// the whole resolution, so a partial member set is never mistaken for a
/// complete one.
#[derive(Debug, Error)]
pub enum ResolutionError {
    /// A nested group chain led back to a group already being expanded.
    #[error("nested group cycle detected while expanding {group}")]
    CycleDetected { group: String },

    /// Fetching a group's direct member list failed.
    #[error("fetching members of {group} failed")]
    Directory {
        group: String,
        #[source]
        source: DirectoryError,
    },
}

/// Failure of a single propagation attempt.
#[derive(Debug, Error)]
pub enum PropagationError {
    /// The directory could not be consulted. Retryable.
    #[error("directory unavailable during {operation} for group {group_id}")]
    UpstreamUnavailable {
        operation: &'static str,
        group_id: String,
        #[source]
        source: DirectoryError,
    },

    /// Membership resolution failed. Retryable; no mirror write has happened.
    #[error("resolving membership of {group_name} (group {group_id}) failed")]
    ResolutionFailed {
        group_id: String,
        group_name: String,
        #[source]
        source: ResolutionError,
    },

    /// The mirror could not be read or written. Retryable.
    #[error("mirror unavailable during {operation} of {mirror_name}")]
    MirrorUnavailable {
        operation: &'static str,
        mirror_name: String,
        #[source]
        source: MirrorError,
    },

    /// The directory returned a group whose id differs from the requested
    /// one. Fatal data-integrity condition; never retried blindly.
    #[error("directory returned group id {fetched} when asked for {requested}")]
    IdentityMismatch { requested: String, fetched: String },
}

impl PropagationError {
    /// Whether redelivering the triggering message can plausibly succeed.
    ///
    /// Everything except an identity mismatch is a transient infrastructure
    /// condition.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        !matches!(self, PropagationError::IdentityMismatch { .. })
    }
}

/// Failure to publish one fan-out propagation request.
#[derive(Debug, Error)]
#[error("publishing propagation request for group {group_id} failed: {message}")]
pub struct SinkError {
    pub group_id: String,
    pub message: String,
}

impl SinkError {
    pub fn new(group_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            group_id: group_id.into(),
            message: message.into(),
        }
    }
}

/// Failure of a full-namespace crawl.
#[derive(Debug, Error)]
pub enum CrawlError {
    /// Listing the namespace failed; nothing was emitted.
    #[error("listing groups under {namespace} failed")]
    List {
        namespace: String,
        #[source]
        source: DirectoryError,
    },

    /// One or more publishes failed. The crawl kept going; `emitted` requests
    /// made it onto the channel and `last` is the most recent failure.
    #[error("{failed} of {attempted} propagation requests failed to publish")]
    Publish {
        failed: usize,
        attempted: usize,
        emitted: usize,
        #[source]
        last: SinkError,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        let retryable = [
            PropagationError::UpstreamUnavailable {
                operation: "fetch group",
                group_id: "g1".into(),
                source: DirectoryError::Transport {
                    operation: "fetch group",
                    target: "g1".into(),
                    message: "connection refused".into(),
                },
            },
            PropagationError::ResolutionFailed {
                group_id: "g1".into(),
                group_name: "org:g1".into(),
                source: ResolutionError::CycleDetected {
                    group: "org:g1".into(),
                },
            },
            PropagationError::MirrorUnavailable {
                operation: "create",
                mirror_name: "@dir-g1".into(),
                source: MirrorError::Api {
                    operation: "create",
                    target: "@dir-g1".into(),
                    status: 503,
                    code: None,
                },
            },
        ];
        for err in retryable {
            assert!(err.is_retryable(), "expected {err} to be retryable");
        }

        let fatal = PropagationError::IdentityMismatch {
            requested: "g1".into(),
            fetched: "g2".into(),
        };
        assert!(!fatal.is_retryable());
    }

    #[test]
    fn test_not_found_helpers() {
        assert!(DirectoryError::NotFound("g1".into()).is_not_found());
        assert!(MirrorError::NotFound("@dir-g1".into()).is_not_found());
        assert!(!MirrorError::Transport {
            operation: "delete",
            target: "@dir-g1".into(),
            message: "timeout".into(),
        }
        .is_not_found());
    }

    #[test]
    fn test_mirror_api_error_display_includes_code() {
        let err = MirrorError::Api {
            operation: "probe",
            target: "@dir-g1".into(),
            status: 500,
            code: Some("ERR_UNCHECKED_EXCEPTION".into()),
        };
        let text = err.to_string();
        assert!(text.contains("500"));
        assert!(text.contains("ERR_UNCHECKED_EXCEPTION"));
    }
}
