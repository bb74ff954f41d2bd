//! Error types for the session layer.

use duelhall_identity::IdentityError;
use duelhall_protocol::{ErrorKind, SessionId};

/// Errors that can occur during session operations.
///
/// Every rejected operation leaves the session exactly as it was.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The move failed the ownership check or the rules engine. The
    /// message is what the client is shown.
    #[error("{0}")]
    InvalidMove(String),

    /// The caller is not allowed to do this (not attached, spectator
    /// proposing a rematch, ...).
    #[error("{0}")]
    Misuse(String),

    /// The session does not exist.
    #[error("session {0} not found")]
    NotFound(SessionId),

    /// The session has ended and accepts no further changes.
    #[error("session {0} has been terminated")]
    Terminated(SessionId),

    /// The session's command channel is full or closed.
    #[error("session {0} is unavailable")]
    Unavailable(SessionId),

    /// Rejoin code lookup or ledger bookkeeping failed.
    #[error(transparent)]
    Identity(#[from] IdentityError),
}

impl SessionError {
    /// The machine-readable class sent to clients.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidMove(_) => ErrorKind::InvalidMove,
            Self::Misuse(_) => ErrorKind::SessionMisuse,
            Self::NotFound(_) => ErrorKind::SessionNotFound,
            Self::Terminated(_) => ErrorKind::SessionTerminated,
            Self::Unavailable(_) => ErrorKind::SessionUnavailable,
            Self::Identity(IdentityError::InvalidRejoinCode) => ErrorKind::InvalidRejoinCode,
            Self::Identity(IdentityError::DuplicateToken) => ErrorKind::SessionMisuse,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_maps_each_variant() {
        let id = SessionId::new();
        assert_eq!(
            SessionError::InvalidMove("x".into()).kind(),
            ErrorKind::InvalidMove
        );
        assert_eq!(
            SessionError::Misuse("x".into()).kind(),
            ErrorKind::SessionMisuse
        );
        assert_eq!(SessionError::NotFound(id).kind(), ErrorKind::SessionNotFound);
        assert_eq!(
            SessionError::Terminated(id).kind(),
            ErrorKind::SessionTerminated
        );
        assert_eq!(
            SessionError::Unavailable(id).kind(),
            ErrorKind::SessionUnavailable
        );
        assert_eq!(
            SessionError::from(IdentityError::InvalidRejoinCode).kind(),
            ErrorKind::InvalidRejoinCode
        );
    }

    #[test]
    fn test_invalid_move_displays_reason_verbatim() {
        let err = SessionError::InvalidMove("Piece at (0, 4) does not belong to black".into());
        assert_eq!(err.to_string(), "Piece at (0, 4) does not belong to black");
    }
}
