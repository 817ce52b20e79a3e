//! # Sensorum
//!
//! A bridge between field sensors and the tools that ask about them.
//!
//! Sensors publish CBOR-encoded [`Measurement`]s to `sensors/<name>` on an MQTT
//! broker. Sensorum subscribes to `sensors/+`, registers every sensor the first
//! time it is heard from (assigning indices `0, 1, 2, ...` in order of first
//! contact) and answers queries about the registry over HTTP:
//!
//! - `GET /sensors/` lists known sensors in index order
//! - `GET /sensors/next/` names the sensor expected to appear next
//!
//! ```rust,no_run
//! use sensorum::{Config, SensorRegistry, Server};
//!
//! # async fn example() -> sensorum::Result<()> {
//! let config = Config::default();
//! let registry = SensorRegistry::new(config.history_depth);
//! let server = Server::bind(config, registry).await?;
//! server
//!     .run(async {
//!         let _ = tokio::signal::ctrl_c().await;
//!     })
//!     .await
//! # }
//! ```

pub mod api;
pub mod config;
pub mod error;
pub mod ingest;
pub mod registry;
pub mod serve;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use config::{BackoffConfig, Config, MqttConfig};
pub use error::{Error, IngestError, Result, TransportError};
pub use ingest::{IngestStats, Listener, MessageHandler, MqttTransport, TopicFilter, Transport};
pub use registry::{Reading, Sensor, SensorRegistry};
pub use serve::Server;

// Re-export the wire format
pub use sensorum_codec as codec;
pub use sensorum_codec::{CodecError, Measurement};
