//! Random tokens and participant ids.

use std::sync::atomic::{AtomicU64, Ordering};

use duelhall_protocol::{ParticipantId, Role};
use rand::Rng;

/// Process-wide participant id counter. Ids stay unique across sessions,
/// so a rematch session never reuses an id from its predecessor.
static NEXT_PARTICIPANT_ID: AtomicU64 = AtomicU64::new(1);

/// Allocates the next participant id.
pub fn next_participant_id() -> ParticipantId {
    ParticipantId(NEXT_PARTICIPANT_ID.fetch_add(1, Ordering::Relaxed))
}

/// Generates a random 32-character hex string (128 bits of entropy).
///
/// Used for rejoin codes and rematch join codes. Only the server and the
/// one client it was handed to ever see it.
pub fn generate_token() -> String {
    let mut rng = rand::rng();
    let bytes: [u8; 16] = rng.random();
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

/// The pair of join codes a rematch session is created with.
///
/// Each code reserves one color; see [`assign_role`](crate::assign_role).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinCodes {
    pub white: String,
    pub black: String,
}

impl JoinCodes {
    /// Mints two fresh, distinct codes.
    pub fn generate() -> Self {
        Self {
            white: generate_token(),
            black: generate_token(),
        }
    }

    /// The role a code reserves, if it is one of ours.
    pub fn role_for(&self, code: &str) -> Option<Role> {
        if code == self.white {
            Some(Role::White)
        } else if code == self.black {
            Some(Role::Black)
        } else {
            None
        }
    }

    /// The code for one primary role. `None` for spectators.
    pub fn code_for(&self, role: Role) -> Option<&str> {
        match role {
            Role::White => Some(&self.white),
            Role::Black => Some(&self.black),
            Role::Spectator => None,
        }
    }
}
