//! Wire protocol for Duelhall.
//!
//! This crate defines the "language" clients and the server speak:
//!
//! - **Types** ([`SessionId`], [`Role`], [`Cell`], [`Move`], ...): the
//!   values every layer passes around.
//! - **Messages** ([`SessionEvent`], [`ClientRequest`], [`Reply`],
//!   [`Envelope`]): what travels in each frame.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]): frames to bytes.
//! - **Errors** ([`ProtocolError`], and the wire-level [`ErrorKind`]).
//!
//! It knows nothing about connections or sessions; it only describes
//! shapes.

mod codec;
mod error;
mod messages;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use messages::{
    ClientRequest, Envelope, ErrorKind, LifecycleState, Reply, ServerMessage, SessionEvent,
    SessionSummary, TerminationReason,
};
pub use types::{
    BoardSnapshot, CardName, Cell, Color, Move, MoveOption, ParticipantId, Piece, PieceKind,
    PlacedPiece, Role, SessionId,
};
