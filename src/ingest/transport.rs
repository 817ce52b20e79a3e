use async_trait::async_trait;

use crate::error::TransportError;

/// What a transport reports on each poll.
#[derive(Debug, Clone, PartialEq)]
pub enum TransportEvent {
    /// A (re)connection to the broker completed; subscriptions must be renewed
    Connected,
    /// An application message arrived
    Message { topic: String, payload: Vec<u8> },
    /// The broker closed the session
    Disconnected,
    /// Protocol traffic with nothing for the listener to do
    Idle,
}

/// A publish/subscribe client the listener pulls messages from.
///
/// Implementations are driven by repeated calls to [`Transport::poll`]; the
/// listener owns reconnect pacing, so a transport should surface a connection
/// failure as an error and try again on the next poll.
#[async_trait]
pub trait Transport: Send {
    /// Subscribe to a topic filter such as `sensors/+`.
    async fn subscribe(&mut self, filter: &str) -> Result<(), TransportError>;

    /// Wait for the next event.
    async fn poll(&mut self) -> Result<TransportEvent, TransportError>;

    /// Close the session. Errors are ignored by callers.
    async fn disconnect(&mut self) -> Result<(), TransportError> {
        Ok(())
    }
}
