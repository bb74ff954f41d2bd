//! The session state machine.
//!
//! `GameSession` is plain synchronous state: every operation runs to
//! completion and either commits all of its effects or none. The actor
//! in [`actor`](crate::actor) serializes access to it; tests drive it
//! directly.
//!
//! ```text
//! WAITING ──(both seats filled)──▶ IN_PROGRESS ──(timer / terminate)──▶ TERMINATED
//!    └──────────────────────(timer / terminate)────────────────────────────▲
//! ```

use std::time::SystemTime;

use duelhall_identity::{
    JoinCodes, Occupancy, ReconnectionLedger, assign_role, generate_token, next_participant_id,
};
use duelhall_protocol::{
    BoardSnapshot, Cell, LifecycleState, Move, MoveOption, ParticipantId, Role, SessionEvent,
    SessionId, SessionSummary, TerminationReason,
};
use duelhall_timer::{LifecycleTimer, Window};
use duelhall_transport::ConnectionId;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::arbiter::arbitrate;
use crate::bus::BroadcastBus;
use crate::participant::Attached;
use crate::state::{display_name, status_line};
use crate::{GameRules, Observer, Participant, SessionConfig, SessionError};

/// How a session came to be.
#[derive(Debug, Clone, Default)]
pub enum SessionOrigin {
    /// Open to anyone; seats are handed out first come, first served.
    #[default]
    Fresh,
    /// Spawned from an agreed rematch. Seats are reserved by join code.
    Rematch { prior: SessionId, codes: JoinCodes },
}

/// What a participant gets back from joining or rejoining.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinTicket {
    pub session_id: SessionId,
    pub participant_id: ParticipantId,
    pub role: Role,
    pub name: String,
    pub rejoin_code: String,
    pub board: BoardSnapshot,
}

/// Outcome of a rematch proposal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RematchVote<D> {
    /// The other player has not agreed yet.
    Pending,
    /// Both players agreed. The new session should be dealt `deck`.
    Agreed { deck: D },
}

/// One live game instance and everything it coordinates.
pub struct GameSession<R: GameRules> {
    id: SessionId,
    state: LifecycleState,
    created_at: SystemTime,
    last_action_at: SystemTime,
    terminated_at: Option<SystemTime>,
    locked_name: Option<String>,
    deck: R::Deck,
    join_codes: Option<JoinCodes>,
    prior_session: Option<SessionId>,
    rules: R,
    bus: BroadcastBus,
    ledger: ReconnectionLedger<Participant>,
    /// The announced follow-up session and its join codes.
    rematch: Option<(SessionId, JoinCodes)>,
    timer: LifecycleTimer,
    changes: broadcast::Sender<SessionSummary>,
}

impl<R: GameRules> GameSession<R> {
    /// Creates a session and arms its join window.
    ///
    /// `changes` receives a [`SessionSummary`] whenever occupancy or
    /// lifecycle changes. It is usually shared by every session in a
    /// registry.
    pub fn new(
        id: SessionId,
        config: &SessionConfig,
        deck: R::Deck,
        origin: SessionOrigin,
        changes: broadcast::Sender<SessionSummary>,
    ) -> Self {
        let (join_codes, prior_session) = match origin {
            SessionOrigin::Fresh => (None, None),
            SessionOrigin::Rematch { prior, codes } => (Some(codes), Some(prior)),
        };
        let now = SystemTime::now();
        let mut session = Self {
            id,
            state: LifecycleState::Waiting,
            created_at: now,
            last_action_at: now,
            terminated_at: None,
            locked_name: config.name.clone(),
            rules: R::initialize(&deck),
            deck,
            join_codes,
            prior_session,
            bus: BroadcastBus::new(),
            ledger: ReconnectionLedger::new(),
            rematch: None,
            timer: LifecycleTimer::new(config.timer.clone()),
            changes,
        };
        session.timer.reset(Window::Join);
        info!(
            session_id = %id,
            prior = ?session.prior_session,
            "session created"
        );
        session.notify();
        session
    }

    // -----------------------------------------------------------------
    // Participants
    // -----------------------------------------------------------------

    /// Admits a newcomer and assigns their role.
    ///
    /// `join_code` only matters in rematch sessions. Announces the
    /// newcomer to everyone else, starts the game if this filled the
    /// second seat, and resets the lifecycle timer.
    ///
    /// # Errors
    /// [`SessionError::Terminated`] once the session has ended.
    pub fn join(
        &mut self,
        name: String,
        join_code: Option<&str>,
        observer: Box<dyn Observer>,
        connection: ConnectionId,
    ) -> Result<JoinTicket, SessionError> {
        self.ensure_live()?;

        let role = assign_role(self.occupancy(), self.join_codes.as_ref(), join_code);
        let participant = Participant {
            id: next_participant_id(),
            name,
            role,
            rejoin_code: generate_token(),
            rematch_accepted: false,
        };
        info!(
            session_id = %self.id,
            participant_id = %participant.id,
            %role,
            name = %participant.name,
            "participant joined"
        );

        let ticket = self.attach(participant, observer, connection);
        self.start_if_ready();
        self.touch();
        self.notify();
        Ok(ticket)
    }

    /// Restores a disconnected participant by their rejoin code.
    ///
    /// The participant keeps their id, name and code. If their primary
    /// seat was taken while they were away, they come back as a
    /// spectator; the current holder is never displaced. A player who
    /// missed a rematch announcement gets their `rematchReady` now.
    ///
    /// # Errors
    /// - [`SessionError::Terminated`] once the session has ended.
    /// - [`SessionError::Identity`] with `InvalidRejoinCode` if no one is
    ///   parked under `code`. Nothing changes.
    pub fn rejoin(
        &mut self,
        code: &str,
        observer: Box<dyn Observer>,
        connection: ConnectionId,
    ) -> Result<JoinTicket, SessionError> {
        self.ensure_live()?;

        let mut participant = self.ledger.reclaim(code)?;
        let seat = participant.role;
        if !self.occupancy().is_free(participant.role) {
            info!(
                session_id = %self.id,
                participant_id = %participant.id,
                seat = %participant.role,
                "seat taken while away, rejoining as spectator"
            );
            participant.role = Role::Spectator;
        }
        info!(
            session_id = %self.id,
            participant_id = %participant.id,
            role = %participant.role,
            "participant rejoined"
        );

        let ticket = self.attach(participant, observer, connection);
        self.resend_rematch(ticket.participant_id, seat);
        self.start_if_ready();
        self.notify();
        Ok(ticket)
    }

    /// Handles a transport-level disconnect.
    ///
    /// The participant leaves the active list, their seat becomes vacant
    /// and they are parked in the ledger under their rejoin code.
    /// Notifications from a connection other than the one currently
    /// bound to the participant are ignored, which keeps a stale socket
    /// from evicting a participant who already rejoined elsewhere.
    ///
    /// Returns `true` if the participant was detached.
    pub fn disconnect(&mut self, participant_id: ParticipantId, connection: ConnectionId) -> bool {
        match self.bus.get(participant_id) {
            Some(member) if member.connection == connection => {}
            Some(_) => {
                debug!(
                    session_id = %self.id,
                    %participant_id,
                    %connection,
                    "disconnect from stale connection ignored"
                );
                return false;
            }
            None => return false,
        }
        let Some(Attached { participant, .. }) = self.bus.detach(participant_id) else {
            return false;
        };

        if self.state.is_terminated() {
            debug!(session_id = %self.id, %participant_id, "detached after termination");
            return true;
        }

        info!(
            session_id = %self.id,
            %participant_id,
            role = %participant.role,
            "participant disconnected"
        );
        self.bus.publish(&SessionEvent::ParticipantDisconnected {
            color: participant.role,
            name: participant.name.clone(),
        });
        if let Err(e) = self.ledger.park(participant.rejoin_code.clone(), participant) {
            warn!(session_id = %self.id, %participant_id, error = %e, "could not park participant");
        }
        self.notify();
        true
    }

    // -----------------------------------------------------------------
    // Play
    // -----------------------------------------------------------------

    /// Runs a move through the arbiter and announces it.
    ///
    /// On success the proposer gets `moveAccepted`, everyone else gets
    /// `moveMade`, and the move window restarts.
    ///
    /// # Errors
    /// - [`SessionError::Terminated`] once the session has ended.
    /// - [`SessionError::Misuse`] if the participant is not attached.
    /// - [`SessionError::InvalidMove`] from the arbiter. Nothing changes.
    pub fn submit_move(&mut self, participant_id: ParticipantId, mv: Move) -> Result<(), SessionError> {
        self.ensure_live()?;
        let role = self.attached(participant_id)?.role;

        if let Err(e) = arbitrate(&mut self.rules, role, &mv) {
            debug!(session_id = %self.id, %participant_id, error = %e, "move rejected");
            return Err(e);
        }

        debug!(
            session_id = %self.id,
            %participant_id,
            from = %mv.initial_position,
            to = %mv.target_position,
            card = %mv.card,
            "move accepted"
        );
        self.touch();
        self.bus
            .send(participant_id, &SessionEvent::MoveAccepted(mv.clone()));
        self.bus
            .broadcast(participant_id, &SessionEvent::MoveMade(mv));

        if let Some(winner) = self.rules.winner() {
            info!(session_id = %self.id, %winner, "game won");
        }
        Ok(())
    }

    /// Where the piece on `cell` could go. A read-only query, answered
    /// even after termination.
    pub fn gather_moves(&self, cell: Cell) -> Vec<MoveOption> {
        self.rules.gather_moves(cell)
    }

    /// Relays a chat line to everyone, sender included.
    ///
    /// # Errors
    /// [`SessionError::Terminated`] or [`SessionError::Misuse`] as for
    /// moves.
    pub fn chat(&mut self, participant_id: ParticipantId, message: String) -> Result<(), SessionError> {
        self.ensure_live()?;
        let sender_name = self.attached(participant_id)?.name.clone();
        self.bus.publish(&SessionEvent::ChatMessage {
            message,
            sender_name,
        });
        Ok(())
    }

    // -----------------------------------------------------------------
    // Rematch
    // -----------------------------------------------------------------

    /// Records a player's wish for a rematch.
    ///
    /// Once both attached players have asked, returns
    /// [`RematchVote::Agreed`] and the caller is expected to create the
    /// new session and call [`announce_rematch`](Self::announce_rematch).
    /// Until then the others are told with `rematchProposed`.
    ///
    /// # Errors
    /// - [`SessionError::Misuse`] for spectators and unattached ids.
    /// - [`SessionError::Terminated`] once the session has ended.
    pub fn propose_rematch(
        &mut self,
        participant_id: ParticipantId,
    ) -> Result<RematchVote<R::Deck>, SessionError> {
        self.ensure_live()?;
        let member = self
            .bus
            .get_mut(participant_id)
            .ok_or_else(|| not_attached(participant_id))?;
        let proposer = &mut member.participant;
        if !proposer.role.is_primary() {
            return Err(SessionError::Misuse(
                "Spectators cannot propose a rematch".into(),
            ));
        }
        proposer.rematch_accepted = true;
        let event = SessionEvent::RematchProposed {
            proposer_name: proposer.name.clone(),
            proposer_id: proposer.id,
            proposer_color: proposer.role,
        };

        let agreed = [Role::White, Role::Black]
            .into_iter()
            .all(|role| self.bus.holder(role).is_some_and(|p| p.rematch_accepted));
        if agreed {
            info!(session_id = %self.id, "rematch agreed");
            return Ok(RematchVote::Agreed {
                deck: self.deck.clone(),
            });
        }

        debug!(session_id = %self.id, %participant_id, "rematch proposed");
        self.bus.broadcast(participant_id, &event);
        Ok(RematchVote::Pending)
    }

    /// Tells each attached player, privately, where the rematch is and
    /// which join code reserves their color. Clears the acceptance flags.
    ///
    /// The codes are kept, so a player who is disconnected right now is
    /// told on [`rejoin`](Self::rejoin).
    pub fn announce_rematch(&mut self, session_id: SessionId, codes: &JoinCodes) {
        self.rematch = Some((session_id, codes.clone()));
        let players: Vec<(ParticipantId, Role)> = self
            .bus
            .participants()
            .filter(|p| p.role.is_primary())
            .map(|p| (p.id, p.role))
            .collect();
        for (id, role) in players {
            let Some(code) = codes.code_for(role) else {
                continue;
            };
            self.bus.send(
                id,
                &SessionEvent::RematchReady {
                    session_id,
                    join_code: code.to_string(),
                },
            );
            if let Some(member) = self.bus.get_mut(id) {
                member.participant.rematch_accepted = false;
            }
        }
        info!(session_id = %self.id, rematch = %session_id, "rematch announced");
    }

    /// Sends `rematchReady` to a returning player whose `seat` had a code
    /// in the announced rematch.
    fn resend_rematch(&mut self, participant_id: ParticipantId, seat: Role) {
        let Some(event) = self.rematch.as_ref().and_then(|(session_id, codes)| {
            codes.code_for(seat).map(|code| SessionEvent::RematchReady {
                session_id: *session_id,
                join_code: code.to_string(),
            })
        }) else {
            return;
        };
        debug!(session_id = %self.id, %participant_id, "repeating rematch code on rejoin");
        self.bus.send(participant_id, &event);
        if let Some(member) = self.bus.get_mut(participant_id) {
            member.participant.rematch_accepted = false;
        }
    }

    // -----------------------------------------------------------------
    // Lifecycle
    // -----------------------------------------------------------------

    /// Ends the session. Exactly once: later calls return `false` and do
    /// nothing.
    ///
    /// Terminates the engine, publishes `gameTerminated`, asks every
    /// attached transport to close and disarms the timer.
    pub fn terminate(&mut self, reason: TerminationReason) -> bool {
        if !self.state.can_transition_to(LifecycleState::Terminated) {
            return false;
        }
        self.rules.terminate();
        self.state = LifecycleState::Terminated;
        self.terminated_at = Some(SystemTime::now());
        self.timer.cancel();

        self.bus
            .publish(&SessionEvent::GameTerminated { reason });
        self.bus.close_all();
        if !self.ledger.is_empty() {
            debug!(
                session_id = %self.id,
                parked = self.ledger.len(),
                "parked participants can no longer rejoin"
            );
        }

        info!(
            session_id = %self.id,
            ?reason,
            winner = ?self.rules.winner(),
            "session terminated"
        );
        self.notify();
        true
    }

    // -----------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------

    pub fn summary(&self) -> SessionSummary {
        let occupancy = self.occupancy();
        let primaries = occupancy.primaries();
        SessionSummary {
            session_id: self.id,
            name: self.name(),
            status: status_line(self.state, self.rules.winner(), primaries),
            state: self.state,
            players: primaries,
            spectators: self.bus.len() - primaries,
        }
    }

    /// The current display name.
    pub fn name(&self) -> String {
        display_name(
            self.locked_name.as_deref(),
            self.bus.holder(Role::White).map(|p| p.name.as_str()),
            self.bus.holder(Role::Black).map(|p| p.name.as_str()),
        )
    }

    pub fn snapshot(&self) -> BoardSnapshot {
        self.rules.snapshot()
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    pub fn rules(&self) -> &R {
        &self.rules
    }

    pub fn deck(&self) -> &R::Deck {
        &self.deck
    }

    pub fn timer(&self) -> &LifecycleTimer {
        &self.timer
    }

    pub fn join_codes(&self) -> Option<&JoinCodes> {
        self.join_codes.as_ref()
    }

    pub fn prior_session(&self) -> Option<SessionId> {
        self.prior_session
    }

    pub fn created_at(&self) -> SystemTime {
        self.created_at
    }

    pub fn last_action_at(&self) -> SystemTime {
        self.last_action_at
    }

    pub fn terminated_at(&self) -> Option<SystemTime> {
        self.terminated_at
    }

    /// Attached participants, in join order.
    pub fn participants(&self) -> Vec<Participant> {
        self.bus.participants().cloned().collect()
    }

    /// Number of participants waiting in the reconnection ledger.
    pub fn disconnected(&self) -> usize {
        self.ledger.len()
    }

    /// A receiver for this session's state-change notifications.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionSummary> {
        self.changes.subscribe()
    }

    // -----------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------

    fn ensure_live(&self) -> Result<(), SessionError> {
        if self.state.is_terminated() {
            return Err(SessionError::Terminated(self.id));
        }
        Ok(())
    }

    fn attached(&self, participant_id: ParticipantId) -> Result<&Participant, SessionError> {
        self.bus
            .get(participant_id)
            .map(|m| &m.participant)
            .ok_or_else(|| not_attached(participant_id))
    }

    fn occupancy(&self) -> Occupancy {
        Occupancy {
            white: self.bus.holder(Role::White).is_some(),
            black: self.bus.holder(Role::Black).is_some(),
            started: self.rules.is_started(),
        }
    }

    /// Puts a participant on the bus and announces them to the others.
    fn attach(
        &mut self,
        participant: Participant,
        observer: Box<dyn Observer>,
        connection: ConnectionId,
    ) -> JoinTicket {
        let ticket = JoinTicket {
            session_id: self.id,
            participant_id: participant.id,
            role: participant.role,
            name: participant.name.clone(),
            rejoin_code: participant.rejoin_code.clone(),
            board: self.rules.snapshot(),
        };
        let announcement = SessionEvent::RoleAssigned {
            color: participant.role,
            id: participant.id,
            name: participant.name.clone(),
        };
        let id = participant.id;
        self.bus.attach(Attached {
            participant,
            observer,
            connection,
        });
        self.bus.broadcast(id, &announcement);
        ticket
    }

    /// Starts the game once both seats are held.
    fn start_if_ready(&mut self) {
        if self.occupancy().primaries() < 2
            || self.rules.is_started()
            || !self.state.can_transition_to(LifecycleState::InProgress)
        {
            return;
        }
        if self.locked_name.is_none() {
            self.locked_name = Some(self.name());
        }
        self.rules.start();
        self.state = LifecycleState::InProgress;
        info!(session_id = %self.id, name = ?self.locked_name, "game started");
        self.bus.publish(&SessionEvent::GameStarted {});
    }

    /// Records a qualifying action and restarts the matching window.
    fn touch(&mut self) {
        self.last_action_at = SystemTime::now();
        let window = match self.state {
            LifecycleState::InProgress => Window::Move,
            _ => Window::Join,
        };
        self.timer.reset(window);
    }

    fn notify(&self) {
        // No subscribers is fine.
        let _ = self.changes.send(self.summary());
    }
}

fn not_attached(participant_id: ParticipantId) -> SessionError {
    SessionError::Misuse(format!("Participant {participant_id} is not attached"))
}

// =========================================================================
// Tests
// =========================================================================
