//! Messages: session events, client requests, server replies.
//!
//! Two directions, two shapes:
//!
//! ```text
//! client ──Envelope<ClientRequest>──▶ server
//! client ◀──Envelope<ServerMessage>── server
//!                    │
//!                    ├── Event(SessionEvent)   pushed by the session
//!                    └── Reply(Reply)          answer to one request
//! ```
//!
//! Session events keep the camelCase names browser clients already listen
//! for (`roleAssigned`, `moveMade`, ...). Requests and replies are
//! framework plumbing and use `PascalCase` type tags.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{BoardSnapshot, Cell, Color, Move, MoveOption, ParticipantId, Role, SessionId};

// ---------------------------------------------------------------------------
// Session lifecycle
// ---------------------------------------------------------------------------

/// Lifecycle of a game session.
///
/// Transitions only move forward:
///
/// ```text
/// Waiting ──▶ InProgress ──▶ Terminated
///    └───────────────────────────▲
/// ```
///
/// A session can be terminated before it ever starts (idle join window),
/// which is the only skip allowed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LifecycleState {
    Waiting,
    InProgress,
    Terminated,
}

impl LifecycleState {
    /// Returns `true` if moving from `self` to `target` is allowed.
    pub fn can_transition_to(self, target: Self) -> bool {
        matches!(
            (self, target),
            (Self::Waiting, Self::InProgress)
                | (Self::Waiting, Self::Terminated)
                | (Self::InProgress, Self::Terminated)
        )
    }

    pub fn is_terminated(self) -> bool {
        matches!(self, Self::Terminated)
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Waiting => write!(f, "WAITING"),
            Self::InProgress => write!(f, "IN_PROGRESS"),
            Self::Terminated => write!(f, "TERMINATED"),
        }
    }
}

/// Why a session ended, reported in `gameTerminated`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TerminationReason {
    /// No reason supplied. This is what the idle deadline reports.
    NotGiven,
    /// An operator or the owning process asked for it.
    Requested,
    /// The server is shutting down.
    Shutdown,
}

/// One row of a lobby listing.
///
/// Also the payload of the session's state-change channel: it is
/// re-published whenever occupancy or lifecycle changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub session_id: SessionId,
    /// Human-readable title, e.g. `"alice vs. bob"`.
    pub name: String,
    /// Human-readable status, e.g. `"awaiting one more player"`.
    pub status: String,
    pub state: LifecycleState,
    /// Attached White/Black participants (0..=2).
    pub players: usize,
    pub spectators: usize,
}

// ---------------------------------------------------------------------------
// Session events
// ---------------------------------------------------------------------------

/// Events the session pushes to attached observers.
///
/// Adjacently tagged, so a client sees
/// `{ "event": "moveMade", "payload": { ... } }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    tag = "event",
    content = "payload",
    rename_all = "camelCase",
    rename_all_fields = "camelCase"
)]
pub enum SessionEvent {
    /// Someone else joined or rejoined.
    RoleAssigned {
        color: Role,
        id: ParticipantId,
        name: String,
    },

    /// Someone else dropped off. Their role slot is free again.
    ParticipantDisconnected { color: Role, name: String },

    /// Both primary roles are filled and the board is live.
    GameStarted {},

    /// Sent only to the participant whose move was committed.
    MoveAccepted(Move),

    /// Sent to everyone except the mover.
    MoveMade(Move),

    ChatMessage { message: String, sender_name: String },

    /// One player asked for a rematch; sent to everyone else.
    RematchProposed {
        proposer_name: String,
        proposer_id: ParticipantId,
        proposer_color: Role,
    },

    /// Both players agreed. Private to each player: where to go and the
    /// join code that reserves their color there.
    RematchReady {
        session_id: SessionId,
        join_code: String,
    },

    /// The session is over; the connection will be closed next.
    GameTerminated { reason: TerminationReason },
}

impl SessionEvent {
    /// The wire name of this event, for logging.
    pub fn name(&self) -> &'static str {
        match self {
            Self::RoleAssigned { .. } => "roleAssigned",
            Self::ParticipantDisconnected { .. } => "participantDisconnected",
            Self::GameStarted {} => "gameStarted",
            Self::MoveAccepted(_) => "moveAccepted",
            Self::MoveMade(_) => "moveMade",
            Self::ChatMessage { .. } => "chatMessage",
            Self::RematchProposed { .. } => "rematchProposed",
            Self::RematchReady { .. } => "rematchReady",
            Self::GameTerminated { .. } => "gameTerminated",
        }
    }
}

// ---------------------------------------------------------------------------
// Errors on the wire
// ---------------------------------------------------------------------------

/// Machine-readable error class attached to every error reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    /// No disconnected participant holds that rejoin code.
    InvalidRejoinCode,
    /// The move failed the ownership check or the rules engine.
    InvalidMove,
    /// The request is not allowed for this participant (e.g. a spectator
    /// proposing a rematch).
    SessionMisuse,
    SessionNotFound,
    SessionTerminated,
    SessionUnavailable,
    /// The request could not be decoded or arrived out of order.
    BadRequest,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let code = match self {
            Self::InvalidRejoinCode => "INVALID_REJOIN_CODE",
            Self::InvalidMove => "INVALID_MOVE",
            Self::SessionMisuse => "SESSION_MISUSE",
            Self::SessionNotFound => "SESSION_NOT_FOUND",
            Self::SessionTerminated => "SESSION_TERMINATED",
            Self::SessionUnavailable => "SESSION_UNAVAILABLE",
            Self::BadRequest => "BAD_REQUEST",
        };
        f.write_str(code)
    }
}

// ---------------------------------------------------------------------------
// Client → server
// ---------------------------------------------------------------------------

/// Everything a client can ask of the server.
///
/// Internally tagged: `{ "type": "Join", "session_id": "...", ... }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ClientRequest {
    // -- Lobby --
    /// Open a fresh session. `name` fixes its display name.
    CreateSession { name: Option<String> },
    ListSessions,

    // -- Entering a session --
    /// Enter a session under a display name. `join_code` only matters for
    /// rematch sessions, where it reserves a color.
    Join {
        session_id: SessionId,
        name: String,
        join_code: Option<String>,
    },
    /// Reclaim an identity after a dropped connection.
    Rejoin {
        session_id: SessionId,
        rejoin_code: String,
    },

    // -- In a session --
    SubmitMove {
        #[serde(rename = "move")]
        mv: Move,
    },
    /// Ask where the piece on `cell` can go.
    GatherMoves { cell: Cell },
    Chat { message: String },
    ProposeRematch,

    // -- Connection --
    Heartbeat { client_time: u64 },
    Leave,
}

// ---------------------------------------------------------------------------
// Server → client
// ---------------------------------------------------------------------------

/// Direct answers to a [`ClientRequest`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Reply {
    SessionCreated { session_id: SessionId },
    SessionList { sessions: Vec<SessionSummary> },

    /// You are in. Keep `rejoin_code` private: it is the only way back
    /// into your seat after a disconnect.
    Joined {
        session_id: SessionId,
        participant_id: ParticipantId,
        color: Role,
        name: String,
        rejoin_code: String,
        board: BoardSnapshot,
    },

    MoveOptions {
        cell: Cell,
        options: Vec<MoveOption>,
    },

    HeartbeatAck { client_time: u64, server_time: u64 },

    Error { kind: ErrorKind, message: String },
}

/// Anything the server sends: a pushed event or a reply.
///
/// `{ "type": "Event", "data": { "event": "gameStarted", "payload": {} } }`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum ServerMessage {
    Event(SessionEvent),
    Reply(Reply),
}

impl From<SessionEvent> for ServerMessage {
    fn from(event: SessionEvent) -> Self {
        Self::Event(event)
    }
}

impl From<Reply> for ServerMessage {
    fn from(reply: Reply) -> Self {
        Self::Reply(reply)
    }
}

/// Top-level frame in both directions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope<P> {
    /// Per-direction sequence number, starting at 1 for the server.
    pub seq: u64,
    /// Milliseconds since the sender's connection started.
    pub timestamp: u64,
    pub payload: P,
}

impl<P> Envelope<P> {
    pub fn new(seq: u64, timestamp: u64, payload: P) -> Self {
        Self {
            seq,
            timestamp,
            payload,
        }
    }
}

// =========================================================================
// Tests
// =========================================================================
