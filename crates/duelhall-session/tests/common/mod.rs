//! Shared fixtures: a spy rules engine and observer helpers.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::sync::atomic::{AtomicUsize, Ordering};

use duelhall_protocol::{
    CardName, Cell, Color, MoveOption, Piece, PieceKind, PlacedPiece, SessionEvent,
};
use duelhall_session::{GameRules, Outbound};
use tokio::sync::mpsc;

/// Deck that carries counters the test can read after the engine has
/// been moved into a session actor.
#[derive(Debug, Clone, Default)]
pub struct SpyDeck {
    pub validations: Arc<AtomicUsize>,
    pub terminations: Arc<AtomicUsize>,
    /// Held by a test to stall the actor inside `gather_moves`.
    pub gate: Arc<Mutex<()>>,
}

impl SpyDeck {
    pub fn validations(&self) -> usize {
        self.validations.load(Ordering::SeqCst)
    }

    pub fn terminations(&self) -> usize {
        self.terminations.load(Ordering::SeqCst)
    }
}

/// Two pieces: a White master on (0, 1) and a Black master on (0, 0).
/// Any move onto the board by the side to move is legal.
#[derive(Debug)]
pub struct SpyRules {
    deck: SpyDeck,
    white: Option<Cell>,
    black: Option<Cell>,
    turn: Color,
    started: bool,
    winner: Option<Color>,
}

impl GameRules for SpyRules {
    type Deck = SpyDeck;

    fn initialize(deck: &SpyDeck) -> Self {
        Self {
            deck: deck.clone(),
            white: Some(Cell::new(0, 1)),
            black: Some(Cell::new(0, 0)),
            turn: Color::White,
            started: false,
            winner: None,
        }
    }

    fn start(&mut self) {
        self.started = true;
    }

    fn terminate(&mut self) {
        self.deck.terminations.fetch_add(1, Ordering::SeqCst);
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
        let kind = PieceKind::Master;
        if self.white == Some(cell) {
            Some(Piece { color: Color::White, kind })
        } else if self.black == Some(cell) {
            Some(Piece { color: Color::Black, kind })
        } else {
            None
        }
    }

    fn pieces(&self) -> Vec<PlacedPiece> {
        [(self.white, Color::White), (self.black, Color::Black)]
            .into_iter()
            .filter_map(|(cell, color)| {
                cell.map(|c| PlacedPiece {
                    x: c.x,
                    y: c.y,
                    piece: Piece { color, kind: PieceKind::Master },
                })
            })
            .collect()
    }

    fn available_cards(&self, _color: Color) -> Vec<CardName> {
        vec!["boar".into()]
    }

    fn gather_moves(&self, cell: Cell) -> Vec<MoveOption> {
        let _open = self.deck.gate.lock();
        if self.cell_contents(cell).is_none() {
            return Vec::new();
        }
        vec![MoveOption {
            cell: Cell::new(cell.x + 1, cell.y),
            cards: vec!["boar".into()],
        }]
    }

    fn validate_move(&self, origin: Cell, target: Cell, _card: &CardName) -> Result<(), String> {
        self.deck.validations.fetch_add(1, Ordering::SeqCst);
        match self.cell_contents(origin) {
            Some(piece) if piece.color == self.turn => {}
            _ => return Err("Not your turn".into()),
        }
        if target.x > 4 || target.y > 4 {
            return Err("Target is off the board".into());
        }
        Ok(())
    }

    fn execute_move(&mut self, origin: Cell, target: Cell, _card: &CardName) {
        let (mine, theirs) = match self.turn {
            Color::White => (&mut self.white, &mut self.black),
            Color::Black => (&mut self.black, &mut self.white),
        };
        if *mine == Some(origin) {
            *mine = Some(target);
            if *theirs == Some(target) {
                *theirs = None;
                self.winner = Some(self.turn);
            }
        }
        self.turn = self.turn.opponent();
    }
}

pub type Rx = mpsc::UnboundedReceiver<Outbound>;

pub fn observer() -> (Box<mpsc::UnboundedSender<Outbound>>, Rx) {
    let (tx, rx) = mpsc::unbounded_channel();
    (Box::new(tx), rx)
}

/// Everything queued so far, without waiting.
pub fn drain(rx: &mut Rx) -> Vec<Outbound> {
    let mut out = Vec::new();
    while let Ok(msg) = rx.try_recv() {
        out.push(msg);
    }
    out
}

pub fn events(rx: &mut Rx) -> Vec<SessionEvent> {
    drain(rx)
        .into_iter()
        .filter_map(|msg| match msg {
            Outbound::Event(event) => Some(event),
            Outbound::Close => None,
        })
        .collect()
}
