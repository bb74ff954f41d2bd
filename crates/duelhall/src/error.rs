//! Unified error type for the Duelhall server.

use duelhall_protocol::ProtocolError;
use duelhall_session::SessionError;
use duelhall_transport::TransportError;

/// Top-level error that wraps every layer's error.
///
/// The `#[from]` attribute on each variant generates the `From` impl, so
/// `?` converts layer errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum DuelhallError {
    /// A transport-level error (bind, accept, send, recv).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A frame could not be encoded or decoded.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A session rejected an operation.
    #[error(transparent)]
    Session(#[from] SessionError),
}
