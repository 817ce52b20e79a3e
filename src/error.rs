//! Error types for the bridge

use sensorum_codec::CodecError;
use thiserror::Error;

/// Result type alias for bridge operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that stop a server from starting or serving
#[derive(Error, Debug)]
pub enum Error {
    /// Socket bind or accept failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Messaging transport failure
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// Rejected configuration value
    #[error("Invalid configuration: {message}")]
    Config { message: String },
}

impl Error {
    /// Create a configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }
}

/// Reasons a single inbound message is dropped.
///
/// These never stop the listener; they are logged and counted.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum IngestError {
    /// The topic is not `<root>/<sensor name>`
    #[error("Topic '{topic}' does not match '{filter}'")]
    TopicMismatch { topic: String, filter: String },

    /// The payload is not a valid measurement
    #[error("Undecodable payload from '{sensor}': {source}")]
    Decode {
        sensor: String,
        #[source]
        source: CodecError,
    },
}

/// Errors raised by a messaging transport
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TransportError {
    /// Broker unreachable or connection dropped; worth retrying
    #[error("Connection error: {0}")]
    Connection(String),

    /// The transport will never produce another event
    #[error("Transport closed")]
    Closed,
}

impl TransportError {
    /// Whether the listener should back off and poll again
    pub fn is_retryable(&self) -> bool {
        matches!(self, TransportError::Connection(_))
    }
}
