//! # Duelhall
//!
//! Session coordinator for two-player, card-driven board games.
//!
//! Duelhall never knows the rules of the game. You implement
//! [`GameRules`] for your engine and the server takes care of seating
//! players, relaying moves, reconnecting dropped clients, offering
//! rematches and closing abandoned sessions.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use duelhall::prelude::*;
//!
//! // Implement GameRules for your engine, then:
//! // duelhall::init_tracing("info");
//! // let server = DuelhallServer::builder()
//! //     .bind("0.0.0.0:8080")
//! //     .build::<MyRules>()
//! //     .await?;
//! // server.run().await
//! ```

mod error;
mod handler;
mod server;

pub use error::DuelhallError;
pub use server::{DuelhallServer, DuelhallServerBuilder, ServerConfig};

/// Installs a `tracing` subscriber that honours `RUST_LOG`.
///
/// `default_directive` (e.g. `"info"` or `"duelhall=debug"`) applies when
/// `RUST_LOG` is unset or unparsable. Safe to call more than once; only
/// the first call installs anything.
pub fn init_tracing(default_directive: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

pub mod prelude {
    pub use crate::{DuelhallError, DuelhallServer, DuelhallServerBuilder, ServerConfig};
    pub use duelhall_protocol::{
        BoardSnapshot, CardName, Cell, ClientRequest, Color, Envelope, ErrorKind, LifecycleState,
        Move, MoveOption, ParticipantId, Piece, PieceKind, PlacedPiece, Reply, Role,
        ServerMessage, SessionEvent, SessionId, SessionSummary, TerminationReason,
    };
    pub use duelhall_session::{GameRules, SessionConfig, SessionError};
    pub use duelhall_timer::TimerConfig;
}
