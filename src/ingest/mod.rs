//! Measurement ingestion
//!
//! The [`Listener`] pulls messages from a [`Transport`], and hands each one to
//! a [`MessageHandler`] which parses the topic, decodes the payload and updates
//! the [`SensorRegistry`]. Bad messages are logged and dropped; connection
//! failures are retried with exponential backoff. Neither ends the listener.

use std::{
    future::Future,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
};

use sensorum_codec::Measurement;

use crate::{
    config::BackoffConfig,
    error::{IngestError, TransportError},
    registry::{Reading, Sensor, SensorRegistry},
};

pub mod backoff;
pub mod mqtt;
pub mod topic;
pub mod transport;

pub use backoff::Backoff;
pub use mqtt::MqttTransport;
pub use topic::TopicFilter;
pub use transport::{Transport, TransportEvent};

/// Counters of accepted and dropped messages. Clones share the counters.
#[derive(Debug, Clone, Default)]
pub struct IngestStats {
    accepted: Arc<AtomicU64>,
    rejected: Arc<AtomicU64>,
}

impl IngestStats {
    pub fn accepted(&self) -> u64 {
        self.accepted.load(Ordering::Relaxed)
    }

    pub fn rejected(&self) -> u64 {
        self.rejected.load(Ordering::Relaxed)
    }
}

/// Turns one inbound message into a registry update.
///
/// Cheap to clone and safe to call from many tasks or threads at once.
#[derive(Debug, Clone)]
pub struct MessageHandler {
    registry: SensorRegistry,
    topics: TopicFilter,
    stats: IngestStats,
}

impl MessageHandler {
    pub fn new(registry: SensorRegistry, topics: TopicFilter) -> Self {
        Self {
            registry,
            topics,
            stats: IngestStats::default(),
        }
    }

    pub fn topics(&self) -> &TopicFilter {
        &self.topics
    }

    pub fn stats(&self) -> &IngestStats {
        &self.stats
    }

    /// Register the publishing sensor and retain its measurement.
    ///
    /// The payload is decoded before the registry is touched, so a message
    /// that fails to decode never creates a sensor.
    pub fn handle(&self, topic: &str, payload: &[u8]) -> Result<Sensor, IngestError> {
        let result = self.try_handle(topic, payload);

        match &result {
            Ok(_) => self.stats.accepted.fetch_add(1, Ordering::Relaxed),
            Err(_) => self.stats.rejected.fetch_add(1, Ordering::Relaxed),
        };

        result
    }

    fn try_handle(&self, topic: &str, payload: &[u8]) -> Result<Sensor, IngestError> {
        let name = self.topics.sensor_name(topic)?;

        let measurement = Measurement::decode(payload).map_err(|source| IngestError::Decode {
            sensor: name.to_string(),
            source,
        })?;

        let sensor = self.registry.register_or_get(name);
        self.registry.record(&sensor.name, Reading::now(measurement));

        tracing::debug!(
            sensor = %sensor.name,
            index = sensor.index,
            timestamp = measurement.timestamp,
            "measurement recorded"
        );

        Ok(sensor)
    }
}

/// Long-running subscription loop over a [`Transport`].
pub struct Listener<T: Transport> {
    transport: T,
    handler: MessageHandler,
    backoff: Backoff,
}

impl<T: Transport> Listener<T> {
    pub fn new(transport: T, handler: MessageHandler, backoff: &BackoffConfig) -> Self {
        Self {
            transport,
            handler,
            backoff: Backoff::new(backoff),
        }
    }

    pub fn handler(&self) -> &MessageHandler {
        &self.handler
    }

    /// Poll the transport until `shutdown` resolves or the transport closes.
    ///
    /// The subscription is renewed on every connect, since the broker may have
    /// dropped it along with the previous session.
    pub async fn run<F>(mut self, shutdown: F)
    where
        F: Future<Output = ()> + Send,
    {
        tokio::pin!(shutdown);

        let filter = self.handler.topics().subscription();
        tracing::info!(filter = %filter, "ingestion listener started");

        loop {
            let event = tokio::select! {
                _ = &mut shutdown => break,
                event = self.transport.poll() => event,
            };

            match event {
                Ok(TransportEvent::Connected) => {
                    self.backoff.reset();
                    match self.transport.subscribe(&filter).await {
                        Ok(()) => tracing::info!(filter = %filter, "connected and subscribed"),
                        Err(e) => tracing::error!(filter = %filter, "subscribe failed: {e}"),
                    }
                }
                Ok(TransportEvent::Message { topic, payload }) => {
                    if let Err(e) = self.handler.handle(&topic, &payload) {
                        tracing::warn!(topic = %topic, "dropping message: {e}");
                    }
                }
                Ok(TransportEvent::Disconnected) => {
                    tracing::warn!("broker closed the session");
                }
                Ok(TransportEvent::Idle) => {}
                Err(TransportError::Closed) => {
                    tracing::info!("transport closed");
                    break;
                }
                Err(e) => {
                    let delay = self.backoff.next_delay();
                    tracing::warn!(retry_in = ?delay, "transport error: {e}");

                    tokio::select! {
                        _ = &mut shutdown => break,
                        _ = tokio::time::sleep(delay) => {}
                    }
                }
            }
        }

        if let Err(e) = self.transport.disconnect().await {
            tracing::debug!("disconnect failed: {e}");
        }

        tracing::info!(
            accepted = self.handler.stats().accepted(),
            rejected = self.handler.stats().rejected(),
            "ingestion listener stopped"
        );
    }
}
