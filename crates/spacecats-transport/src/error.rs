use std::time::Duration;

/// Errors that can occur in the transport layer.
///
/// Only connecting can fail from the caller's point of view. Sends are
/// fire-and-forget, and a socket dying later shows up as a
/// [`TransportEventKind::Closed`](crate::TransportEventKind::Closed) event.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The WebSocket handshake failed or the relay refused the connection.
    #[error("failed to connect to {url}: {source}")]
    Connect {
        url: String,
        #[source]
        source: tokio_tungstenite::tungstenite::Error,
    },

    /// The relay didn't complete the handshake in time.
    #[error("connecting to {url} timed out after {after:?}")]
    Timeout { url: String, after: Duration },
}
