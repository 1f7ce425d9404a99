//! # groupcast-events
//!
//! Kafka event channel for the propagation service.
//!
//! Events are JSON envelopes (`event_id`, `event_type`, `timestamp`,
//! `payload`) on fixed topics. The producer keys single-group propagation
//! requests by group id so redeliveries for one group stay ordered; the
//! consumer dispatches by event type and translates handler outcomes into
//! acknowledgement: commit on success, one in-process redelivery for a
//! transient failure, then drop with an error log.

pub mod config;
pub mod consumer;
pub mod delivery;
pub mod envelope;
pub mod error;
pub mod event;
pub mod events;
pub mod health;
pub mod producer;

pub use config::{KafkaConfig, SecurityProtocol};
pub use consumer::{Dispatcher, EventConsumer, EventHandler, HandlerError};
pub use delivery::DeliveryTracker;
pub use envelope::{EventEnvelope, RawEnvelope};
pub use error::EventError;
pub use event::Event;
pub use events::{PropagateGroup, RefreshAll};
pub use health::HealthStatus;
pub use producer::EventProducer;
