use std::{net::SocketAddr, process::ExitCode, time::Duration};

use clap::Parser;
use tracing_subscriber::EnvFilter;

use sensorum::{
    BackoffConfig, Config, MqttConfig, SensorRegistry, Server,
    config::{DEFAULT_MQTT_PORT, DEFAULT_TOPIC_ROOT},
};

/// Sensor registry and MQTT measurement ingestion bridge
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Address the query API listens on
    #[arg(long, env = "SENSORUM_HTTP_ADDR", default_value = "0.0.0.0:1234")]
    http_addr: SocketAddr,

    /// MQTT broker host
    #[arg(long, env = "MQTT_HOST", default_value = "localhost")]
    mqtt_host: String,

    /// MQTT broker port
    #[arg(long, env = "MQTT_PORT", default_value_t = DEFAULT_MQTT_PORT)]
    mqtt_port: u16,

    /// MQTT client id
    #[arg(long, env = "MQTT_CLIENT_ID", default_value = "sensorum")]
    client_id: String,

    /// Sensors publish to <topic-root>/<name>
    #[arg(long, env = "SENSORUM_TOPIC_ROOT", default_value = DEFAULT_TOPIC_ROOT)]
    topic_root: String,

    /// MQTT keep-alive in seconds
    #[arg(long, default_value_t = 30)]
    keep_alive: u64,

    /// Readings retained per sensor (0 disables retention)
    #[arg(long, env = "SENSORUM_HISTORY", default_value_t = 1)]
    history_depth: usize,

    /// Longest reconnect delay in seconds
    #[arg(long, default_value_t = 30)]
    max_backoff: u64,

    /// Log filter used when RUST_LOG is unset
    #[arg(long, default_value = "info")]
    log_level: String,
}

impl Args {
    fn into_config(self) -> Config {
        Config {
            http_addr: self.http_addr,
            mqtt: MqttConfig {
                host: self.mqtt_host,
                port: self.mqtt_port,
                client_id: self.client_id,
                topic_root: self.topic_root,
                keep_alive: Duration::from_secs(self.keep_alive),
                ..Default::default()
            },
            backoff: BackoffConfig {
                max: Duration::from_secs(self.max_backoff),
                ..Default::default()
            },
            history_depth: self.history_depth,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    tracing::info!("Sensorum v{}", env!("CARGO_PKG_VERSION"));

    let config = args.into_config();
    let registry = SensorRegistry::new(config.history_depth);

    let server = match Server::bind(config, registry).await {
        Ok(server) => server,
        Err(e) => {
            tracing::error!("failed to start: {e}");
            return ExitCode::FAILURE;
        }
    };

    match server.run(shutdown_signal()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("server error: {e}");
            ExitCode::FAILURE
        }
    }
}

/// Resolves on Ctrl-C, or SIGTERM on Unix.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("unable to listen for Ctrl-C: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("unable to listen for SIGTERM: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
