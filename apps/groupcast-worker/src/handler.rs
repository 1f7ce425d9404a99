//! Event handlers bridging the channel to the propagation engine.
//!
//! Handlers translate engine results into the channel's acknowledgement
//! vocabulary: retryable engine failures become transient handler errors
//! (one redelivery), data-integrity failures become fatal ones (dropped and
//! alerted on).

use async_trait::async_trait;
use std::sync::Arc;
use tracing::error;

use groupcast_core::{Crawler, Propagator};
use groupcast_events::{EventHandler, HandlerError, PropagateGroup, RefreshAll};

/// Render an error with its full source chain, so one log line carries the
/// whole diagnosis.
fn error_chain(err: &(dyn std::error::Error + 'static)) -> String {
    let mut text = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        text.push_str(": ");
        text.push_str(&cause.to_string());
        source = cause.source();
    }
    text
}

/// Handles single-group propagation requests.
pub struct PropagateGroupHandler {
    propagator: Arc<Propagator>,
}

impl PropagateGroupHandler {
    pub fn new(propagator: Arc<Propagator>) -> Self {
        Self { propagator }
    }
}

#[async_trait]
impl EventHandler<PropagateGroup> for PropagateGroupHandler {
    async fn handle(&self, event: PropagateGroup) -> Result<(), HandlerError> {
        match self.propagator.propagate(&event.group_id).await {
            Ok(()) => Ok(()),
            Err(err) => {
                let detail = error_chain(&err);
                error!(group_id = %event.group_id, error = %detail, "Propagation failed");
                if err.is_retryable() {
                    Err(HandlerError::Transient(detail))
                } else {
                    Err(HandlerError::Fatal(detail))
                }
            }
        }
    }
}

/// Handles full-resync triggers by fanning out one request per group.
pub struct RefreshAllHandler {
    crawler: Arc<Crawler>,
}

impl RefreshAllHandler {
    pub fn new(crawler: Arc<Crawler>) -> Self {
        Self { crawler }
    }
}

#[async_trait]
impl EventHandler<RefreshAll> for RefreshAllHandler {
    async fn handle(&self, _event: RefreshAll) -> Result<(), HandlerError> {
        match self.crawler.crawl_all().await {
            Ok(_emitted) => Ok(()),
            Err(err) => {
                let detail = error_chain(&err);
                error!(error = %detail, "Crawl failed");
                // Listing and publish failures are both broker/service
                // conditions; a redelivered crawl is harmless either way.
                Err(HandlerError::Transient(detail))
            }
        }
    }
}
