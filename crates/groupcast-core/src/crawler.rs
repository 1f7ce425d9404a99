//! Full-resync fan-out over a directory namespace.

use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::error::CrawlError;
use crate::ports::{DirectoryPort, PropagationSink};

/// Walks every group under the configured namespace and requests an
/// asynchronous propagation for each one, except the exempt public group.
///
/// The crawl is a forward-propagation mechanism only: it triggers creation
/// and update of groups the directory currently has, and never consults the
/// mirror to discover groups that should be deleted. Deletion happens
/// reactively when a specific group is later propagated and found missing.
pub struct Crawler {
    directory: Arc<dyn DirectoryPort>,
    sink: Arc<dyn PropagationSink>,
    namespace: String,
    exempt_group_id: String,
}

impl Crawler {
    pub fn new(
        directory: Arc<dyn DirectoryPort>,
        sink: Arc<dyn PropagationSink>,
        namespace: impl Into<String>,
        exempt_group_id: impl Into<String>,
    ) -> Self {
        Self {
            directory,
            sink,
            namespace: namespace.into(),
            exempt_group_id: exempt_group_id.into(),
        }
    }

    /// Emit one propagation request per non-exempt group in the namespace.
    ///
    /// Returns the number of requests emitted. A listing failure aborts the
    /// crawl with nothing emitted; a publish failure for one group is logged
    /// and the crawl keeps going, returning the last such failure at the end
    /// so a publish problem for one group never blocks the rest.
    pub async fn crawl_all(&self) -> Result<usize, CrawlError> {
        // The namespace doubles as the search prefix and the folder scope.
        let groups = self
            .directory
            .groups_by_prefix(&self.namespace, &self.namespace)
            .await
            .map_err(|source| CrawlError::List {
                namespace: self.namespace.clone(),
                source,
            })?;

        let mut attempted = 0;
        let mut emitted = 0;
        let mut last_failure = None;

        for group in &groups {
            if group.id == self.exempt_group_id {
                debug!(group_id = %group.id, "Skipping exempt public group during crawl");
                continue;
            }
            attempted += 1;
            match self.sink.request_propagation(&group.id).await {
                Ok(()) => emitted += 1,
                Err(error) => {
                    warn!(
                        group_id = %group.id,
                        error = %error,
                        "Failed publishing propagation request, continuing crawl"
                    );
                    last_failure = Some(error);
                }
            }
        }

        match last_failure {
            None => {
                info!(
                    namespace = %self.namespace,
                    listed = groups.len(),
                    emitted,
                    "Crawl complete"
                );
                Ok(emitted)
            }
            Some(last) => Err(CrawlError::Publish {
                failed: attempted - emitted,
                attempted,
                emitted,
                last,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::DirectoryGroup;
    use crate::ports::testing::{MapDirectory, RecordingSink};

    fn listing(ids: &[&str]) -> MapDirectory {
        MapDirectory {
            listing: ids
                .iter()
                .map(|id| DirectoryGroup::new(*id, format!("org:{id}")))
                .collect(),
            ..MapDirectory::default()
        }
    }

    #[tokio::test]
    async fn test_emits_one_request_per_group_excluding_exempt() {
        let directory = listing(&["p1", "p2", "exempt-id"]);
        let sink = Arc::new(RecordingSink::default());
        let crawler = Crawler::new(Arc::new(directory), sink.clone(), "org", "exempt-id");

        let emitted = crawler.crawl_all().await.unwrap();

        assert_eq!(emitted, 2);
        assert_eq!(*sink.requested.lock().unwrap(), vec!["p1", "p2"]);
    }

    #[tokio::test]
    async fn test_listing_failure_emits_nothing() {
        // No listing configured and a directory that errors on listing.
        struct FailingDirectory;
        #[async_trait::async_trait]
        impl DirectoryPort for FailingDirectory {
            async fn group_by_id(
                &self,
                id: &str,
            ) -> Result<DirectoryGroup, crate::error::DirectoryError> {
                Err(crate::error::DirectoryError::NotFound(id.to_string()))
            }
            async fn group_by_name(
                &self,
                name: &str,
            ) -> Result<DirectoryGroup, crate::error::DirectoryError> {
                Err(crate::error::DirectoryError::NotFound(name.to_string()))
            }
            async fn groups_by_prefix(
                &self,
                _prefix: &str,
                folder: &str,
            ) -> Result<Vec<DirectoryGroup>, crate::error::DirectoryError> {
                Err(crate::error::DirectoryError::UnexpectedStatus {
                    operation: "list groups",
                    target: folder.to_string(),
                    status: 502,
                })
            }
            async fn group_members(
                &self,
                name: &str,
            ) -> Result<Vec<crate::model::DirectoryMember>, crate::error::DirectoryError> {
                Err(crate::error::DirectoryError::NotFound(name.to_string()))
            }
            async fn check(&self) -> Result<(), crate::error::DirectoryError> {
                Ok(())
            }
        }

        let sink = Arc::new(RecordingSink::default());
        let crawler = Crawler::new(Arc::new(FailingDirectory), sink.clone(), "org", "exempt-id");

        let err = crawler.crawl_all().await.unwrap_err();
        assert!(matches!(err, CrawlError::List { .. }));
        assert!(sink.requested.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_publish_failure_does_not_stop_the_crawl() {
        let directory = listing(&["p1", "p2", "p3"]);
        let sink = Arc::new(RecordingSink {
            failing_ids: vec!["p2".into()],
            ..RecordingSink::default()
        });
        let crawler = Crawler::new(Arc::new(directory), sink.clone(), "org", "exempt-id");

        let err = crawler.crawl_all().await.unwrap_err();

        match err {
            CrawlError::Publish {
                failed,
                attempted,
                emitted,
                last,
            } => {
                assert_eq!(failed, 1);
                assert_eq!(attempted, 3);
                assert_eq!(emitted, 2);
                assert_eq!(last.group_id, "p2");
            }
            other => panic!("expected Publish, got {other:?}"),
        }
        // p1 and p3 still made it out.
        assert_eq!(*sink.requested.lock().unwrap(), vec!["p1", "p3"]);
    }
}
