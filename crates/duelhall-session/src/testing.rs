//! A small rules engine for unit tests.
//!
//! 5x5 board, White on row 4 and Black on row 0, masters in the middle
//! column. Every card moves a piece anywhere on the board; legality is
//! limited to turn order, bounds, card ownership and not landing on a
//! friendly piece. Capturing a master wins.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use duelhall_protocol::{CardName, Cell, Color, MoveOption, Piece, PieceKind, PlacedPiece};

use crate::GameRules;

/// Shared with the engine so tests can count `validate_move` calls.
#[derive(Debug, Clone, Default)]
pub(crate) struct SpyDeck {
    pub(crate) validations: Arc<AtomicUsize>,
}

impl SpyDeck {
    pub(crate) fn validations(&self) -> usize {
        self.validations.load(Ordering::SeqCst)
    }
}

#[derive(Debug)]
pub(crate) struct TestRules {
    deck: SpyDeck,
    board: HashMap<Cell, Piece>,
    turn: Color,
    started: bool,
    terminated: bool,
    winner: Option<Color>,
}

impl TestRules {
    pub(crate) fn terminated(&self) -> bool {
        self.terminated
    }
}

fn cards(color: Color) -> Vec<CardName> {
    match color {
        Color::White => vec!["tiger".into(), "crab".into()],
        Color::Black => vec!["ox".into(), "eel".into()],
    }
}

impl GameRules for TestRules {
    type Deck = SpyDeck;

    fn initialize(deck: &SpyDeck) -> Self {
        let mut board = HashMap::new();
        for x in 0..5 {
            let kind = if x == 2 {
                PieceKind::Master
            } else {
                PieceKind::Student
            };
            board.insert(Cell::new(x, 4), Piece { color: Color::White, kind });
            board.insert(Cell::new(x, 0), Piece { color: Color::Black, kind });
        }
        Self {
            deck: deck.clone(),
            board,
            turn: Color::White,
            started: false,
            terminated: false,
            winner: None,
        }
    }

    fn start(&mut self) {
        self.started = true;
    }

    fn terminate(&mut self) {
        self.terminated = true;
    }

    fn is_started(&self) -> bool {
        self.started
    }

    fn winner(&self) -> Option<Color> {
        self.winner
    }

    fn current_turn(&self) -> Color {
        self.turn
    }

    fn cell_contents(&self, cell: Cell) -> Option<Piece> {
        self.board.get(&cell).copied()
    }

    fn pieces(&self) -> Vec<PlacedPiece> {
        let mut pieces: Vec<_> = self
            .board
            .iter()
            .map(|(cell, piece)| PlacedPiece {
                x: cell.x,
                y: cell.y,
                piece: *piece,
            })
            .collect();
        pieces.sort_by_key(|p| (p.y, p.x));
        pieces
    }

    fn available_cards(&self, color: Color) -> Vec<CardName> {
        cards(color)
    }

    fn gather_moves(&self, cell: Cell) -> Vec<MoveOption> {
        let Some(piece) = self.cell_contents(cell) else {
            return Vec::new();
        };
        let forward = match piece.color {
            Color::White => cell.y.checked_sub(1),
            Color::Black => Some(cell.y + 1).filter(|y| *y < 5),
        };
        forward
            .map(|y| MoveOption {
                cell: Cell::new(cell.x, y),
                cards: cards(piece.color),
            })
            .into_iter()
            .collect()
    }

    fn validate_move(&self, origin: Cell, target: Cell, card: &CardName) -> Result<(), String> {
        self.deck.validations.fetch_add(1, Ordering::SeqCst);
        if !self.started || self.winner.is_some() {
            return Err("Game is not in play".into());
        }
        let piece = self
            .cell_contents(origin)
            .ok_or_else(|| "No piece at origin".to_string())?;
        if piece.color != self.turn {
            return Err("Not your turn".into());
        }
        if target.x > 4 || target.y > 4 {
            return Err("Target is off the board".into());
        }
        if !cards(piece.color).contains(card) {
            return Err(format!("Card {card} is not available"));
        }
        if self
            .cell_contents(target)
            .is_some_and(|p| p.color == piece.color)
        {
            return Err("Target is occupied by your own piece".into());
        }
        Ok(())
    }

    fn execute_move(&mut self, origin: Cell, target: Cell, _card: &CardName) {
        if let Some(piece) = self.board.remove(&origin) {
            if let Some(captured) = self.board.insert(target, piece) {
                if captured.kind == PieceKind::Master {
                    self.winner = Some(piece.color);
                }
            }
            self.turn = self.turn.opponent();
        }
    }
}
