//! Kafka event producer.

use rdkafka::config::ClientConfig;
use rdkafka::producer::{FutureProducer, FutureRecord, Producer};
use std::time::Duration;
use tracing::{debug, info};

use crate::config::KafkaConfig;
use crate::envelope::EventEnvelope;
use crate::error::EventError;
use crate::event::Event;
use crate::health::HealthStatus;

const SEND_TIMEOUT: Duration = Duration::from_secs(5);

/// Publishes enveloped events to the broker.
pub struct EventProducer {
    producer: FutureProducer,
}

impl EventProducer {
    /// Create a producer from broker settings. The connection itself is
    /// established lazily on first publish.
    pub fn new(config: &KafkaConfig) -> Result<Self, EventError> {
        let mut client_config = ClientConfig::new();
        client_config
            .set("bootstrap.servers", &config.bootstrap_servers)
            .set("client.id", &config.client_id)
            .set("security.protocol", config.security_protocol.as_str())
            .set("message.timeout.ms", "5000")
            .set("acks", "all");

        let producer: FutureProducer =
            client_config
                .create()
                .map_err(|e| EventError::ConnectionFailed {
                    broker: config.bootstrap_servers.clone(),
                    cause: e.to_string(),
                })?;

        info!(
            bootstrap_servers = %config.bootstrap_servers,
            client_id = %config.client_id,
            "Event producer created"
        );

        Ok(Self { producer })
    }

    /// Wrap an event in a fresh envelope and publish it.
    pub async fn publish<E: Event>(&self, event: E) -> Result<(), EventError> {
        self.publish_envelope(EventEnvelope::new(event)).await
    }

    /// Publish a pre-constructed envelope.
    pub async fn publish_envelope<E: Event>(
        &self,
        envelope: EventEnvelope<E>,
    ) -> Result<(), EventError> {
        let topic = E::TOPIC;
        let key = envelope.message_key();
        let payload = envelope.to_json_bytes()?;

        debug!(
            topic,
            event_id = %envelope.event_id,
            key = %key,
            payload_size = payload.len(),
            "Publishing event"
        );

        let (partition, offset) = self
            .producer
            .send(
                FutureRecord::to(topic).key(&key).payload(&payload),
                SEND_TIMEOUT,
            )
            .await
            .map_err(|(err, _)| EventError::PublishFailed {
                topic: topic.to_string(),
                cause: err.to_string(),
            })?;

        debug!(topic, partition, offset, "Event published");
        Ok(())
    }

    /// Probe broker connectivity by fetching cluster metadata.
    pub fn health_check(&self) -> Result<HealthStatus, EventError> {
        let metadata = self
            .producer
            .client()
            .fetch_metadata(None, SEND_TIMEOUT)
            .map_err(EventError::Kafka)?;

        Ok(HealthStatus {
            connected: true,
            brokers: metadata.brokers().len(),
            topics: metadata.topics().len(),
        })
    }

    /// Flush any queued messages, bounded by `timeout`. Called on shutdown.
    pub fn flush(&self, timeout: Duration) -> Result<(), EventError> {
        self.producer.flush(timeout).map_err(EventError::Kafka)
    }
}
