//! Identity and board value types shared by every layer.
//!
//! Everything here travels on the wire, so each type's serde shape is part
//! of the client contract and is pinned down by the tests at the bottom.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// Globally unique identifier of one game session.
///
/// Sessions are addressed by clients (join links, rematch redirects), so
/// unlike participant ids they must not be guessable or reused across
/// process restarts. A v4 UUID covers both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(pub Uuid);

impl SessionId {
    /// Generates a fresh random session id.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of one participant within the server process.
///
/// A participant keeps its id across disconnect/rejoin; it is what other
/// clients see in `roleAssigned` and `rematchProposed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParticipantId(pub u64);

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P-{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Colors and roles
// ---------------------------------------------------------------------------

/// One of the two sides of the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Color {
    White,
    Black,
}

impl Color {
    /// The other side.
    pub fn opponent(self) -> Self {
        match self {
            Self::White => Self::Black,
            Self::Black => Self::White,
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::White => write!(f, "white"),
            Self::Black => write!(f, "black"),
        }
    }
}

/// The part a participant plays in a session.
///
/// Only the two primary roles may move pieces. On the wire this is the
/// `color` field of `roleAssigned`, so a spectator is reported as
/// `"spectator"` rather than being absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    White,
    Black,
    Spectator,
}

impl Role {
    /// The side this role plays, or `None` for spectators.
    pub fn color(self) -> Option<Color> {
        match self {
            Self::White => Some(Color::White),
            Self::Black => Some(Color::Black),
            Self::Spectator => None,
        }
    }

    /// `true` for White and Black.
    pub fn is_primary(self) -> bool {
        self.color().is_some()
    }
}

impl From<Color> for Role {
    fn from(color: Color) -> Self {
        match color {
            Color::White => Self::White,
            Color::Black => Self::Black,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::White => write!(f, "white"),
            Self::Black => write!(f, "black"),
            Self::Spectator => write!(f, "spectator"),
        }
    }
}

// ---------------------------------------------------------------------------
// Board values
// ---------------------------------------------------------------------------

/// A board coordinate.
///
/// Serialized as a two-element array `[x, y]`, which is how clients
/// already address cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "(u8, u8)", into = "(u8, u8)")]
pub struct Cell {
    pub x: u8,
    pub y: u8,
}

impl Cell {
    pub fn new(x: u8, y: u8) -> Self {
        Self { x, y }
    }
}

impl From<(u8, u8)> for Cell {
    fn from((x, y): (u8, u8)) -> Self {
        Self { x, y }
    }
}

impl From<Cell> for (u8, u8) {
    fn from(cell: Cell) -> Self {
        (cell.x, cell.y)
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Name of a movement card, as the rules engine knows it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CardName(pub String);

impl From<&str> for CardName {
    fn from(name: &str) -> Self {
        Self(name.to_owned())
    }
}

impl fmt::Display for CardName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PieceKind {
    Master,
    Student,
}

/// A piece standing on the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Piece {
    pub color: Color,
    pub kind: PieceKind,
}

/// A piece together with the cell it occupies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlacedPiece {
    pub x: u8,
    pub y: u8,
    pub piece: Piece,
}

impl PlacedPiece {
    pub fn cell(&self) -> Cell {
        Cell::new(self.x, self.y)
    }
}

/// A proposed move.
///
/// Deliberately carries no color: who is moving is decided by which
/// participant submitted it, never by the payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Move {
    pub initial_position: Cell,
    pub target_position: Cell,
    pub card: CardName,
}

/// A reachable target cell and the cards that reach it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveOption {
    pub cell: Cell,
    pub cards: Vec<CardName>,
}

/// What a joining or rejoining client needs to draw the board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardSnapshot {
    pub pieces: Vec<PlacedPiece>,
    pub white_cards: Vec<CardName>,
    pub black_cards: Vec<CardName>,
    pub current_turn: Color,
    pub started: bool,
    pub winner: Option<Color>,
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_id_serializes_as_uuid_string() {
        let id = SessionId::new();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{}\"", id.0));
    }

    #[test]
    fn test_session_id_new_is_unique() {
        assert_ne!(SessionId::new(), SessionId::new());
    }

    #[test]
    fn test_participant_id_serializes_as_plain_number() {
        assert_eq!(serde_json::to_string(&ParticipantId(42)).unwrap(), "42");
        assert_eq!(ParticipantId(7).to_string(), "P-7");
    }

    #[test]
    fn test_role_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Role::White).unwrap(), "\"white\"");
        assert_eq!(
            serde_json::to_string(&Role::Spectator).unwrap(),
            "\"spectator\""
        );
    }

    #[test]
    fn test_role_color_only_for_primaries() {
        assert_eq!(Role::White.color(), Some(Color::White));
        assert_eq!(Role::Black.color(), Some(Color::Black));
        assert_eq!(Role::Spectator.color(), None);
        assert!(!Role::Spectator.is_primary());
        assert_eq!(Role::from(Color::Black), Role::Black);
    }

    #[test]
    fn test_color_opponent_flips() {
        assert_eq!(Color::White.opponent(), Color::Black);
        assert_eq!(Color::Black.opponent(), Color::White);
    }

    #[test]
    fn test_cell_serializes_as_array() {
        let json = serde_json::to_string(&Cell::new(2, 4)).unwrap();
        assert_eq!(json, "[2,4]");
        let cell: Cell = serde_json::from_str("[0,3]").unwrap();
        assert_eq!(cell, Cell::new(0, 3));
        assert_eq!(cell.to_string(), "(0, 3)");
    }

    #[test]
    fn test_move_uses_camel_case_fields() {
        let mv = Move {
            initial_position: Cell::new(0, 4),
            target_position: Cell::new(0, 3),
            card: "tiger".into(),
        };
        let json: serde_json::Value = serde_json::to_value(&mv).unwrap();
        assert_eq!(json["initialPosition"], serde_json::json!([0, 4]));
        assert_eq!(json["targetPosition"], serde_json::json!([0, 3]));
        assert_eq!(json["card"], "tiger");
    }

    #[test]
    fn test_move_rejects_three_element_cell() {
        let bad = r#"{"initialPosition":[0,1,2],"targetPosition":[0,1],"card":"ox"}"#;
        assert!(serde_json::from_str::<Move>(bad).is_err());
    }
}
