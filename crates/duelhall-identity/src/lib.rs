//! Participant identity for Duelhall.
//!
//! This crate answers three questions for a game session:
//!
//! 1. **Which role does a newcomer get?** ([`assign_role`]) A pure policy
//!    over the current seat occupancy and the optional rematch join codes.
//! 2. **How does a participant prove who they are later?** ([`generate_token`],
//!    [`JoinCodes`]) Unguessable random tokens.
//! 3. **Where do disconnected participants wait?** ([`ReconnectionLedger`])
//!    A token-keyed holding area they can be reclaimed from.
//!
//! # How it fits in the stack
//!
//! ```text
//! Session Layer (above)  ← owns seats, calls the policy, parks leavers
//!     ↕
//! Identity Layer (this crate)  ← decides roles, mints and checks tokens
//!     ↕
//! Protocol Layer (below)  ← provides Role, ParticipantId
//! ```
//!
//! Nothing here is async or shared: the session actor owns one ledger and
//! calls these functions from its own task.

mod error;
mod ledger;
mod policy;
mod token;

pub use error::IdentityError;
pub use ledger::ReconnectionLedger;
pub use policy::{Occupancy, assign_role};
pub use token::{JoinCodes, generate_token, next_participant_id};
