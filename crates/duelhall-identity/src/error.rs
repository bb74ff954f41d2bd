//! Error types for the identity layer.

/// Errors from token checks and ledger bookkeeping.
#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    /// No disconnected participant is parked under this token. It may
    /// never have existed, or it was already used to rejoin.
    #[error("invalid rejoin code")]
    InvalidRejoinCode,

    /// A participant is already parked under this token.
    #[error("rejoin code already in use")]
    DuplicateToken,
}
