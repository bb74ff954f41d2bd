//! The reconnection ledger: where disconnected participants wait.
//!
//! A participant lives in exactly one place at a time: the session's
//! active list while attached, this ledger while disconnected. Moving
//! between the two is always a *move* of the value, so the "never both"
//! rule is enforced by ownership rather than by bookkeeping.
//!
//! ```text
//!   active list ──(disconnect: park)──→ ledger
//!        ↑                                 │
//!        └──────(rejoin: reclaim)──────────┘
//! ```
//!
//! Entries have no grace period. They stay until the owning session is
//! terminated and drops the ledger.

use std::collections::HashMap;

use crate::IdentityError;

/// Disconnected participants keyed by their private rejoin token.
///
/// Generic over the entry so the session layer can park its own
/// participant record without this crate knowing its shape.
#[derive(Debug)]
pub struct ReconnectionLedger<T> {
    parked: HashMap<String, T>,
}

impl<T> ReconnectionLedger<T> {
    pub fn new() -> Self {
        Self {
            parked: HashMap::new(),
        }
    }

    /// Parks an entry under `token`.
    ///
    /// # Errors
    /// Returns [`IdentityError::DuplicateToken`] if the token is already
    /// taken; the existing entry is left in place.
    pub fn park(&mut self, token: String, entry: T) -> Result<(), IdentityError> {
        if self.parked.contains_key(&token) {
            return Err(IdentityError::DuplicateToken);
        }
        self.parked.insert(token, entry);
        tracing::debug!(parked = self.parked.len(), "participant parked");
        Ok(())
    }

    /// Takes the entry parked under `token` out of the ledger.
    ///
    /// Exact match only. A token can be reclaimed once; a second attempt
    /// fails like any unknown token.
    ///
    /// # Errors
    /// Returns [`IdentityError::InvalidRejoinCode`] on a miss. The ledger
    /// is unchanged.
    pub fn reclaim(&mut self, token: &str) -> Result<T, IdentityError> {
        self.parked
            .remove(token)
            .ok_or(IdentityError::InvalidRejoinCode)
    }

    pub fn len(&self) -> usize {
        self.parked.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parked.is_empty()
    }
}

impl<T> Default for ReconnectionLedger<T> {
    fn default() -> Self {
        Self::new()
    }
}

// =========================================================================
// Tests
// =========================================================================
