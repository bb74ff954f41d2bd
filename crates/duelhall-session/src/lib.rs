//! Game session coordination for Duelhall.
//!
//! Each session runs as an isolated Tokio task (actor model) that owns
//! the rules engine, the participants, and the lifecycle timer. Nothing
//! outside the task touches session state; everything goes through a
//! [`SessionHandle`].
//!
//! # Key types
//!
//! - [`GameRules`]: the contract the rules engine implements
//! - [`Observer`]: where a participant's events go
//! - [`GameSession`]: the state machine itself (synchronous, testable)
//! - [`SessionHandle`]: send commands to a running session actor
//! - [`SessionManager`]: creates, finds, lists and prunes sessions
//! - [`SessionConfig`]: name, timer windows, channel size
//!
//! # How a command flows
//!
//! ```text
//! handler ──SessionHandle──▶ actor task ──▶ GameSession
//!                                              │
//!                       arbiter ◀──────────────┤ (moves)
//!                       GameRules ◀────────────┤
//!                       BroadcastBus ──────────┘──▶ observers
//! ```

mod actor;
mod arbiter;
mod bus;
mod config;
mod error;
mod manager;
mod observer;
mod participant;
mod rules;
mod session;
mod state;

#[cfg(test)]
mod testing;

pub use actor::{SessionHandle, spawn_session};
pub use bus::Recipient;
pub use config::SessionConfig;
pub use error::SessionError;
pub use manager::SessionManager;
pub use observer::{DeliveryError, Observer, ObserverSender, Outbound};
pub use participant::Participant;
pub use rules::GameRules;
pub use session::{GameSession, JoinTicket, RematchVote, SessionOrigin};
pub use state::{display_name, status_line};
