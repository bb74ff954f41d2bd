//! The `GameRules` trait: the contract with the rules engine.
//!
//! The session never looks inside the board. It asks the engine what is
//! on a cell, whether a move is legal, and tells it to execute moves.
//! Board geometry, card semantics and win conditions all live behind
//! this trait.

use std::fmt;

use duelhall_protocol::{BoardSnapshot, CardName, Cell, Color, MoveOption, Piece, PlacedPiece};

/// The rules engine for one game instance.
///
/// The session owns its engine exclusively and only touches it from the
/// actor task, so implementations need `Send` but not `Sync`.
pub trait GameRules: Sized + Send + 'static {
    /// The card set a game is dealt from. A rematch inherits its
    /// predecessor's deck.
    type Deck: Clone + Default + fmt::Debug + Send + Sync + 'static;

    /// Creates a fresh, not-yet-started game.
    fn initialize(deck: &Self::Deck) -> Self;

    /// Called once, when both primary seats are first filled.
    fn start(&mut self);

    /// Called once, when the session is terminated.
    fn terminate(&mut self);

    fn is_started(&self) -> bool;

    /// The winning side, once there is one.
    fn winner(&self) -> Option<Color>;

    fn current_turn(&self) -> Color;

    /// The piece standing on `cell`, if any.
    fn cell_contents(&self, cell: Cell) -> Option<Piece>;

    /// Every piece on the board.
    fn pieces(&self) -> Vec<PlacedPiece>;

    /// Cards `color` may currently play.
    fn available_cards(&self, color: Color) -> Vec<CardName>;

    /// Where the piece on `cell` could go, and with which cards.
    fn gather_moves(&self, cell: Cell) -> Vec<MoveOption>;

    /// Checks a move without applying it.
    ///
    /// `Err` carries a human-readable reason that is relayed to the
    /// client as-is.
    fn validate_move(&self, origin: Cell, target: Cell, card: &CardName) -> Result<(), String>;

    /// Applies a move that [`validate_move`](Self::validate_move) accepted.
    fn execute_move(&mut self, origin: Cell, target: Cell, card: &CardName);

    /// Everything a client needs to draw the board.
    fn snapshot(&self) -> BoardSnapshot {
        BoardSnapshot {
            pieces: self.pieces(),
            white_cards: self.available_cards(Color::White),
            black_cards: self.available_cards(Color::Black),
            current_turn: self.current_turn(),
            started: self.is_started(),
            winner: self.winner(),
        }
    }
}
