use async_trait::async_trait;
use rumqttc::{AsyncClient, Event, EventLoop, MqttOptions, Packet, QoS};

use super::transport::{Transport, TransportEvent};
use crate::{config::MqttConfig, error::TransportError};

/// [`Transport`] backed by an MQTT broker.
///
/// The event loop reconnects on the next poll after a failure, so errors are
/// always reported as retryable.
pub struct MqttTransport {
    client: AsyncClient,
    eventloop: EventLoop,
    broker: (String, u16),
}

impl MqttTransport {
    /// Create the client. No connection is made until the first poll.
    pub fn new(config: &MqttConfig) -> Self {
        let mut options =
            MqttOptions::new(config.client_id.clone(), config.host.clone(), config.port);
        options.set_keep_alive(config.keep_alive);

        let (client, eventloop) = AsyncClient::new(options, config.channel_capacity);

        Self {
            client,
            eventloop,
            broker: (config.host.clone(), config.port),
        }
    }
}

impl std::fmt::Debug for MqttTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MqttTransport")
            .field("broker", &self.broker)
            .finish()
    }
}

#[async_trait]
impl Transport for MqttTransport {
    async fn subscribe(&mut self, filter: &str) -> Result<(), TransportError> {
        self.client
            .subscribe(filter, QoS::AtLeastOnce)
            .await
            .map_err(|e| TransportError::Connection(e.to_string()))
    }

    async fn poll(&mut self) -> Result<TransportEvent, TransportError> {
        match self.eventloop.poll().await {
            Ok(Event::Incoming(Packet::Publish(publish))) => Ok(TransportEvent::Message {
                topic: publish.topic,
                payload: publish.payload.to_vec(),
            }),
            Ok(Event::Incoming(Packet::ConnAck(_))) => Ok(TransportEvent::Connected),
            Ok(Event::Incoming(Packet::Disconnect)) => Ok(TransportEvent::Disconnected),
            Ok(_) => Ok(TransportEvent::Idle),
            Err(e) => Err(TransportError::Connection(e.to_string())),
        }
    }

    async fn disconnect(&mut self) -> Result<(), TransportError> {
        self.client
            .disconnect()
            .await
            .map_err(|e| TransportError::Connection(e.to_string()))
    }
}
