//! Error types for the protocol layer.
//!
//! Each Duelhall crate owns its error enum. A `ProtocolError` always means
//! bytes could not be turned into a message (or back), never that a game
//! rule was broken.

/// Errors that can occur while encoding or decoding wire messages.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serializing a message failed.
    #[cfg(feature = "json")]
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// The bytes were not a valid message: malformed JSON, an unknown
    /// `type` tag, or missing fields.
    #[cfg(feature = "json")]
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// The message decoded but makes no sense in context.
    #[error("invalid message: {0}")]
    InvalidMessage(String),
}
