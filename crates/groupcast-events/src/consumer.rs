//! Dispatching Kafka consumer with bounded redelivery.
//!
//! One consumer subscribes to every registered topic, parses the envelope,
//! and routes by event type. Handler results drive acknowledgement: success
//! commits; a transient failure gets exactly one in-process redelivery before
//! the event is dropped with an error log (poison-message guard); a fatal
//! failure is dropped immediately.

use async_trait::async_trait;
use futures::future::BoxFuture;
use futures::StreamExt;
use rdkafka::config::ClientConfig;
use rdkafka::consumer::{CommitMode, Consumer, StreamConsumer};
use rdkafka::message::{BorrowedMessage, Message};
use rdkafka::TopicPartitionList;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

use crate::config::KafkaConfig;
use crate::delivery::DeliveryTracker;
use crate::envelope::RawEnvelope;
use crate::error::EventError;
use crate::event::Event;

/// How long to wait before the single redelivery of a transiently failed
/// event.
const REDELIVERY_DELAY: Duration = Duration::from_secs(2);

/// How many completed event ids to remember for duplicate suppression.
const TRACKER_CAPACITY: usize = 4096;

/// How an event handler fared.
#[derive(Debug, thiserror::Error)]
pub enum HandlerError {
    /// A temporary condition; redelivering the event may succeed.
    #[error("{0}")]
    Transient(String),

    /// Retrying cannot help; the event must be dropped and alerted on.
    #[error("{0}")]
    Fatal(String),
}

/// Typed handler for one event type.
#[async_trait]
pub trait EventHandler<E: Event>: Send + Sync + 'static {
    async fn handle(&self, event: E) -> Result<(), HandlerError>;
}

type RouteFn =
    Arc<dyn Fn(serde_json::Value) -> BoxFuture<'static, Result<(), HandlerError>> + Send + Sync>;

struct Route {
    topic: &'static str,
    call: RouteFn,
}

/// Maps event types to handlers.
#[derive(Default)]
pub struct Dispatcher {
    routes: HashMap<&'static str, Route>,
}

impl Dispatcher {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler for an event type. The handler's topic is added to
    /// the consumer's subscription.
    #[must_use]
    pub fn on<E: Event, H: EventHandler<E>>(mut self, handler: H) -> Self {
        let handler = Arc::new(handler);
        let call: RouteFn = Arc::new(move |payload: serde_json::Value| {
            let handler = handler.clone();
            Box::pin(async move {
                let event: E = serde_json::from_value(payload).map_err(|e| {
                    HandlerError::Fatal(format!("invalid {} payload: {e}", E::EVENT_TYPE))
                })?;
                handler.handle(event).await
            })
        });
        self.routes.insert(
            E::EVENT_TYPE,
            Route {
                topic: E::TOPIC,
                call,
            },
        );
        self
    }

    fn topics(&self) -> Vec<&'static str> {
        let mut topics: Vec<&'static str> = self.routes.values().map(|r| r.topic).collect();
        topics.sort_unstable();
        topics.dedup();
        topics
    }

    fn route(&self, event_type: &str) -> Option<&Route> {
        self.routes.get(event_type)
    }
}

/// Consumes events and feeds them through a [`Dispatcher`].
pub struct EventConsumer {
    consumer: StreamConsumer,
    group_id: String,
}

impl EventConsumer {
    /// Create a consumer for the given service, deriving the consumer group
    /// id from the broker config's prefix.
    pub fn new(config: &KafkaConfig, service: &str) -> Result<Self, EventError> {
        let group_id = config.consumer_group(service);

        let mut client_config = ClientConfig::new();
        client_config
            .set("bootstrap.servers", &config.bootstrap_servers)
            .set("client.id", &config.client_id)
            .set("group.id", &group_id)
            .set("security.protocol", config.security_protocol.as_str())
            .set("auto.offset.reset", "earliest")
            .set("enable.auto.commit", "false")
            .set("session.timeout.ms", "30000");

        let consumer: StreamConsumer =
            client_config
                .create()
                .map_err(|e| EventError::ConnectionFailed {
                    broker: config.bootstrap_servers.clone(),
                    cause: e.to_string(),
                })?;

        info!(
            group_id = %group_id,
            bootstrap_servers = %config.bootstrap_servers,
            "Event consumer created"
        );

        Ok(Self { consumer, group_id })
    }

    #[must_use]
    pub fn group_id(&self) -> &str {
        &self.group_id
    }

    /// Run the consume loop until the stream ends or the future is dropped
    /// (worker shutdown).
    pub async fn run(self, dispatcher: Dispatcher) -> Result<(), EventError> {
        let topics = dispatcher.topics();
        self.consumer
            .subscribe(&topics)
            .map_err(|e| EventError::ConsumeFailed {
                topic: topics.join(","),
                cause: e.to_string(),
            })?;
        info!(topics = ?topics, group_id = %self.group_id, "Subscribed, consuming events");

        let mut tracker = DeliveryTracker::new(TRACKER_CAPACITY);
        let mut stream = self.consumer.stream();

        while let Some(result) = stream.next().await {
            match result {
                Ok(message) => {
                    if let Err(e) = self
                        .process_message(&dispatcher, &mut tracker, &message)
                        .await
                    {
                        error!(error = %e, "Failed to process message");
                    }
                }
                Err(e) => {
                    error!(error = %e, "Error receiving message");
                }
            }
        }

        info!("Consumer stream ended");
        Ok(())
    }

    async fn process_message(
        &self,
        dispatcher: &Dispatcher,
        tracker: &mut DeliveryTracker,
        message: &BorrowedMessage<'_>,
    ) -> Result<(), EventError> {
        let payload = message.payload().ok_or_else(|| EventError::InvalidEnvelope {
            reason: "empty message payload".into(),
        })?;

        let raw = RawEnvelope::from_bytes(payload)?;
        raw.validate()?;

        if tracker.is_completed(raw.event_id) {
            debug!(event_id = %raw.event_id, "Duplicate delivery, skipping");
            self.commit(message)?;
            return Ok(());
        }

        let Some(route) = dispatcher.route(&raw.event_type) else {
            warn!(
                event_id = %raw.event_id,
                event_type = %raw.event_type,
                "No handler registered for event type, dropping"
            );
            self.commit(message)?;
            return Ok(());
        };

        debug!(event_id = %raw.event_id, event_type = %raw.event_type, "Dispatching event");

        match (route.call)(raw.payload.clone()).await {
            Ok(()) => {
                tracker.mark_completed(raw.event_id);
                self.commit(message)?;
            }
            Err(HandlerError::Fatal(reason)) => {
                error!(
                    event_id = %raw.event_id,
                    event_type = %raw.event_type,
                    reason = %reason,
                    "Dropping event after fatal handler error"
                );
                tracker.mark_completed(raw.event_id);
                self.commit(message)?;
            }
            Err(HandlerError::Transient(reason)) => {
                warn!(
                    event_id = %raw.event_id,
                    event_type = %raw.event_type,
                    reason = %reason,
                    "Handler failed, redelivering once"
                );
                tokio::time::sleep(REDELIVERY_DELAY).await;
                match (route.call)(raw.payload).await {
                    Ok(()) => {
                        debug!(event_id = %raw.event_id, "Redelivery succeeded");
                    }
                    Err(second) => {
                        error!(
                            event_id = %raw.event_id,
                            event_type = %raw.event_type,
                            reason = %second,
                            "Dropping event after second failure"
                        );
                    }
                }
                tracker.mark_completed(raw.event_id);
                self.commit(message)?;
            }
        }

        Ok(())
    }

    fn commit(&self, message: &BorrowedMessage<'_>) -> Result<(), EventError> {
        let mut tpl = TopicPartitionList::new();
        tpl.add_partition_offset(
            message.topic(),
            message.partition(),
            rdkafka::Offset::Offset(message.offset() + 1),
        )
        .map_err(EventError::Kafka)?;

        self.consumer
            .commit(&tpl, CommitMode::Async)
            .map_err(EventError::Kafka)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{PropagateGroup, RefreshAll};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingHandler {
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl EventHandler<PropagateGroup> for CountingHandler {
        async fn handle(&self, _event: PropagateGroup) -> Result<(), HandlerError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    struct NoopRefreshHandler;

    #[async_trait]
    impl EventHandler<RefreshAll> for NoopRefreshHandler {
        async fn handle(&self, _event: RefreshAll) -> Result<(), HandlerError> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_dispatcher_routes_by_event_type() {
        let calls = Arc::new(AtomicUsize::new(0));
        let dispatcher = Dispatcher::new()
            .on(CountingHandler {
                calls: calls.clone(),
            })
            .on(NoopRefreshHandler);

        let route = dispatcher.route("groupcast.sync.group").unwrap();
        (route.call)(serde_json::json!({"group_id": "g1"}))
            .await
            .unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        assert!(dispatcher.route("groupcast.sync.unknown").is_none());
    }

    #[tokio::test]
    async fn test_dispatcher_invalid_payload_is_fatal() {
        let dispatcher = Dispatcher::new().on(CountingHandler {
            calls: Arc::new(AtomicUsize::new(0)),
        });

        let route = dispatcher.route("groupcast.sync.group").unwrap();
        let err = (route.call)(serde_json::json!({"nope": true}))
            .await
            .unwrap_err();
        assert!(matches!(err, HandlerError::Fatal(_)));
    }

    #[test]
    fn test_dispatcher_topics_are_deduplicated_and_sorted() {
        let dispatcher = Dispatcher::new()
            .on(CountingHandler {
                calls: Arc::new(AtomicUsize::new(0)),
            })
            .on(NoopRefreshHandler);

        assert_eq!(
            dispatcher.topics(),
            vec!["groupcast.sync.group", "groupcast.sync.refresh"]
        );
    }
}
