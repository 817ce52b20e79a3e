use std::{future::Future, net::SocketAddr};

use tokio::{net::TcpListener, sync::watch};

use crate::{
    api,
    config::Config,
    error::Result,
    ingest::{Listener, MessageHandler, MqttTransport, TopicFilter, Transport},
    registry::SensorRegistry,
};

/// A bound bridge: the HTTP socket is listening, the transport is created but
/// not yet polled.
pub struct Server<T: Transport> {
    config: Config,
    registry: SensorRegistry,
    listener: TcpListener,
    transport: T,
}

impl Server<MqttTransport> {
    /// Validate `config`, bind the query API and create the MQTT client.
    pub async fn bind(config: Config, registry: SensorRegistry) -> Result<Self> {
        let transport = MqttTransport::new(&config.mqtt);
        Self::bind_with_transport(config, registry, transport).await
    }
}

impl<T: Transport + 'static> Server<T> {
    /// Like [`Server::bind`] with a caller-supplied transport.
    pub async fn bind_with_transport(
        config: Config,
        registry: SensorRegistry,
        transport: T,
    ) -> Result<Self> {
        config.validate()?;

        let listener = TcpListener::bind(config.http_addr).await?;
        tracing::info!(addr = %listener.local_addr()?, "query API bound");

        Ok(Self {
            config,
            registry,
            listener,
            transport,
        })
    }

    /// Address the query API actually listens on
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    pub fn registry(&self) -> &SensorRegistry {
        &self.registry
    }

    /// Serve queries and ingest measurements until `shutdown` resolves.
    ///
    /// Both halves stop on shutdown and release their sockets before this
    /// returns. A failure of the HTTP server stops ingestion too.
    pub async fn run<F>(self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let (stop_tx, stop_rx) = watch::channel(false);

        let handler = MessageHandler::new(
            self.registry.clone(),
            TopicFilter::new(&self.config.mqtt.topic_root),
        );
        let listener = Listener::new(self.transport, handler, &self.config.backoff);
        let ingest = tokio::spawn(listener.run(stopped(stop_rx.clone())));

        let trigger = tokio::spawn(async move {
            shutdown.await;
            tracing::info!("shutdown requested");
            let _ = stop_tx.send(true);
        });

        let app = api::router(self.registry);
        let served = axum::serve(self.listener, app)
            .with_graceful_shutdown(stopped(stop_rx))
            .await;

        if let Err(e) = &served {
            tracing::error!("query API failed: {e}");
            trigger.abort();
            ingest.abort();
        }

        if let Err(e) = ingest.await {
            if !e.is_cancelled() {
                tracing::error!("ingestion task failed: {e}");
            }
        }

        served?;
        tracing::info!("server stopped");
        Ok(())
    }
}

/// Resolves once the stop flag is raised or its sender is gone.
async fn stopped(mut rx: watch::Receiver<bool>) {
    let _ = rx.wait_for(|stop| *stop).await;
}
