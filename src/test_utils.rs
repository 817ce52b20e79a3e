//! Test utilities for driving the bridge without a broker
//!
//! [`channel_transport`] returns a [`Transport`] fed by a [`TransportHandle`];
//! every call on the handle becomes one poll result on the listener side.
//! [`TransportHandle::close`], or dropping every handle, closes the transport,
//! which ends the listener.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use sensorum_codec::Measurement;
use tokio::sync::mpsc;

use crate::{
    error::TransportError,
    ingest::{Transport, TransportEvent},
};

type Scripted = Result<TransportEvent, TransportError>;

/// Create a connected transport/handle pair
pub fn channel_transport() -> (ChannelTransport, TransportHandle) {
    let (tx, rx) = mpsc::unbounded_channel();
    let subscriptions = Arc::new(Mutex::new(Vec::new()));

    (
        ChannelTransport {
            rx,
            subscriptions: subscriptions.clone(),
        },
        TransportHandle { tx, subscriptions },
    )
}

/// Listener side of [`channel_transport`]
pub struct ChannelTransport {
    rx: mpsc::UnboundedReceiver<Scripted>,
    subscriptions: Arc<Mutex<Vec<String>>>,
}

#[async_trait]
impl Transport for ChannelTransport {
    async fn subscribe(&mut self, filter: &str) -> Result<(), TransportError> {
        self.subscriptions.lock().unwrap().push(filter.to_string());
        Ok(())
    }

    async fn poll(&mut self) -> Result<TransportEvent, TransportError> {
        self.rx.recv().await.unwrap_or(Err(TransportError::Closed))
    }
}

/// Publisher side of [`channel_transport`]
#[derive(Clone)]
pub struct TransportHandle {
    tx: mpsc::UnboundedSender<Scripted>,
    subscriptions: Arc<Mutex<Vec<String>>>,
}

impl TransportHandle {
    pub fn connect(&self) {
        let _ = self.tx.send(Ok(TransportEvent::Connected));
    }

    pub fn publish(&self, topic: &str, payload: Vec<u8>) {
        let _ = self.tx.send(Ok(TransportEvent::Message {
            topic: topic.to_string(),
            payload,
        }));
    }

    /// Publish an encoded measurement
    pub fn publish_measurement(&self, topic: &str, measurement: &Measurement) {
        let payload = measurement.encode().unwrap();
        self.publish(topic, payload);
    }

    /// Simulate a dropped broker connection
    pub fn fail(&self, reason: &str) {
        let _ = self
            .tx
            .send(Err(TransportError::Connection(reason.to_string())));
    }

    /// End the transport while keeping this handle usable
    pub fn close(&self) {
        let _ = self.tx.send(Err(TransportError::Closed));
    }

    /// Filters subscribed so far, in order
    pub fn subscriptions(&self) -> Vec<String> {
        self.subscriptions.lock().unwrap().clone()
    }
}

/// A plausible reading with the given illuminance
pub fn sample_measurement(lux: f32) -> Measurement {
    Measurement::builder()
        .timestamp(1_700_000_000)
        .lux(lux)
        .humidity(48.0)
        .temperature_c(21.5)
        .soil(410.0)
        .salt(120.0)
        .battery_mv(4_050)
        .firmware(0, 1, 0)
        .build()
}
