use std::net::SocketAddr;

/// Errors raised while moving frames between the server and a client.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The peer went away.
    #[error("connection closed: {0}")]
    ConnectionClosed(String),

    /// Writing a frame failed.
    #[error("send failed: {0}")]
    SendFailed(#[source] std::io::Error),

    /// Reading a frame failed.
    #[error("receive failed: {0}")]
    ReceiveFailed(#[source] std::io::Error),

    /// Binding the listener or accepting a socket failed.
    #[error("accept failed: {0}")]
    AcceptFailed(#[source] std::io::Error),

    /// A socket was accepted but never became a WebSocket. The listener
    /// is unaffected.
    #[error("handshake with {peer} failed: {reason}")]
    Handshake { peer: SocketAddr, reason: String },
}

impl TransportError {
    /// `true` if the failure concerns one client only.
    pub fn is_per_client(&self) -> bool {
        !matches!(self, Self::AcceptFailed(_))
    }
}
