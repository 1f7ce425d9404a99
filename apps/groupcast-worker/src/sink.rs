//! Event-producer adapter for the engine's propagation sink port.

use async_trait::async_trait;
use std::sync::Arc;

use groupcast_core::error::SinkError;
use groupcast_core::ports::PropagationSink;
use groupcast_events::{EventProducer, PropagateGroup};

/// Publishes fan-out propagation requests through the Kafka producer, keeping
/// the engine itself free of messaging concerns.
pub struct ProducerSink {
    producer: Arc<EventProducer>,
}

impl ProducerSink {
    pub fn new(producer: Arc<EventProducer>) -> Self {
        Self { producer }
    }
}

#[async_trait]
impl PropagationSink for ProducerSink {
    async fn request_propagation(&self, group_id: &str) -> Result<(), SinkError> {
        self.producer
            .publish(PropagateGroup::new(group_id))
            .await
            .map_err(|e| SinkError::new(group_id, e.to_string()))
    }
}
