//! Session actor: an isolated Tokio task that owns one [`GameSession`].
//!
//! Commands arrive over a bounded mpsc channel and are answered on
//! oneshot reply channels. The lifecycle deadline is another branch of
//! the same `select!`, so a timeout and a command can never interleave.
//! The loop is biased toward the deadline: once it has passed, it wins
//! over anything still queued.

use duelhall_identity::JoinCodes;
use duelhall_protocol::{
    BoardSnapshot, Cell, Move, MoveOption, ParticipantId, SessionId, SessionSummary,
    TerminationReason,
};
use duelhall_transport::ConnectionId;
use tokio::sync::{broadcast, mpsc, oneshot};

use crate::{
    GameRules, GameSession, JoinTicket, Observer, RematchVote, SessionConfig, SessionError,
    SessionOrigin,
};

type Reply<T> = oneshot::Sender<Result<T, SessionError>>;

/// Commands sent to a session actor through its channel.
pub(crate) enum SessionCommand<R: GameRules> {
    Join {
        name: String,
        join_code: Option<String>,
        observer: Box<dyn Observer>,
        connection: ConnectionId,
        reply: Reply<JoinTicket>,
    },
    Rejoin {
        rejoin_code: String,
        observer: Box<dyn Observer>,
        connection: ConnectionId,
        reply: Reply<JoinTicket>,
    },
    Disconnect {
        participant_id: ParticipantId,
        connection: ConnectionId,
        reply: oneshot::Sender<bool>,
    },
    SubmitMove {
        participant_id: ParticipantId,
        mv: Move,
        reply: Reply<()>,
    },
    GatherMoves {
        cell: Cell,
        reply: oneshot::Sender<Vec<MoveOption>>,
    },
    Chat {
        participant_id: ParticipantId,
        message: String,
        reply: Reply<()>,
    },
    ProposeRematch {
        participant_id: ParticipantId,
        reply: Reply<RematchVote<R::Deck>>,
    },
    AnnounceRematch {
        session_id: SessionId,
        codes: JoinCodes,
    },
    Terminate {
        reason: TerminationReason,
        reply: oneshot::Sender<bool>,
    },
    Summary {
        reply: oneshot::Sender<SessionSummary>,
    },
    Snapshot {
        reply: oneshot::Sender<BoardSnapshot>,
    },
}

/// Handle to a running session actor.
///
/// Cheap to clone: it is an `mpsc::Sender` plus the state-change
/// broadcaster. The actor stops once every handle is dropped.
pub struct SessionHandle<R: GameRules> {
    session_id: SessionId,
    sender: mpsc::Sender<SessionCommand<R>>,
    changes: broadcast::Sender<SessionSummary>,
}

impl<R: GameRules> Clone for SessionHandle<R> {
    fn clone(&self) -> Self {
        Self {
            session_id: self.session_id,
            sender: self.sender.clone(),
            changes: self.changes.clone(),
        }
    }
}

impl<R: GameRules> SessionHandle<R> {
    pub fn session_id(&self) -> SessionId {
        self.session_id
    }

    /// A receiver for state-change notifications.
    ///
    /// When the session was spawned by a [`SessionManager`](crate::SessionManager)
    /// the channel is shared, so summaries from every session arrive here;
    /// filter on `session_id` if only this one matters.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionSummary> {
        self.changes.subscribe()
    }

    /// Sends a command and waits for its reply.
    async fn request<T>(
        &self,
        command: impl FnOnce(oneshot::Sender<T>) -> SessionCommand<R>,
    ) -> Result<T, SessionError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(command(reply_tx))
            .await
            .map_err(|_| SessionError::Unavailable(self.session_id))?;
        reply_rx
            .await
            .map_err(|_| SessionError::Unavailable(self.session_id))
    }

    /// Joins the session. See [`GameSession::join`].
    pub async fn join(
        &self,
        name: String,
        join_code: Option<String>,
        observer: Box<dyn Observer>,
        connection: ConnectionId,
    ) -> Result<JoinTicket, SessionError> {
        self.request(|reply| SessionCommand::Join {
            name,
            join_code,
            observer,
            connection,
            reply,
        })
        .await?
    }

    /// Rejoins with a rejoin code. See [`GameSession::rejoin`].
    pub async fn rejoin(
        &self,
        rejoin_code: String,
        observer: Box<dyn Observer>,
        connection: ConnectionId,
    ) -> Result<JoinTicket, SessionError> {
        self.request(|reply| SessionCommand::Rejoin {
            rejoin_code,
            observer,
            connection,
            reply,
        })
        .await?
    }

    /// Reports a dropped connection. Returns `true` if the participant
    /// was detached.
    pub async fn disconnect(
        &self,
        participant_id: ParticipantId,
        connection: ConnectionId,
    ) -> Result<bool, SessionError> {
        self.request(|reply| SessionCommand::Disconnect {
            participant_id,
            connection,
            reply,
        })
        .await
    }

    pub async fn submit_move(&self, participant_id: ParticipantId, mv: Move) -> Result<(), SessionError> {
        self.request(|reply| SessionCommand::SubmitMove {
            participant_id,
            mv,
            reply,
        })
        .await?
    }

    pub async fn gather_moves(&self, cell: Cell) -> Result<Vec<MoveOption>, SessionError> {
        self.request(|reply| SessionCommand::GatherMoves { cell, reply })
            .await
    }

    pub async fn chat(&self, participant_id: ParticipantId, message: String) -> Result<(), SessionError> {
        self.request(|reply| SessionCommand::Chat {
            participant_id,
            message,
            reply,
        })
        .await?
    }

    pub async fn propose_rematch(
        &self,
        participant_id: ParticipantId,
    ) -> Result<RematchVote<R::Deck>, SessionError> {
        self.request(|reply| SessionCommand::ProposeRematch {
            participant_id,
            reply,
        })
        .await?
    }

    /// Hands each player their join code for the rematch (fire-and-forget).
    pub async fn announce_rematch(&self, session_id: SessionId, codes: JoinCodes) -> Result<(), SessionError> {
        self.sender
            .send(SessionCommand::AnnounceRematch { session_id, codes })
            .await
            .map_err(|_| SessionError::Unavailable(self.session_id))
    }

    /// Ends the session. Returns `false` if it had already ended.
    pub async fn terminate(&self, reason: TerminationReason) -> Result<bool, SessionError> {
        self.request(|reply| SessionCommand::Terminate { reason, reply })
            .await
    }

    pub async fn summary(&self) -> Result<SessionSummary, SessionError> {
        self.request(|reply| SessionCommand::Summary { reply }).await
    }

    pub async fn snapshot(&self) -> Result<BoardSnapshot, SessionError> {
        self.request(|reply| SessionCommand::Snapshot { reply }).await
    }
}

/// Runs the actor loop until every handle is dropped.
///
/// A terminated session keeps answering queries (and rejecting changes)
/// for as long as someone holds a handle.
async fn run<R: GameRules>(
    mut session: GameSession<R>,
    mut receiver: mpsc::Receiver<SessionCommand<R>>,
) {
    let session_id = session.id();
    tracing::debug!(%session_id, "session actor started");

    loop {
        tokio::select! {
            biased;

            () = session.timer().expired() => {
                tracing::info!(%session_id, "lifecycle deadline passed");
                session.terminate(TerminationReason::NotGiven);
            }

            cmd = receiver.recv() => {
                match cmd {
                    Some(cmd) => handle(&mut session, cmd),
                    None => break,
                }
            }
        }
    }

    // Dropped without an explicit terminate (e.g. registry shut down).
    session.terminate(TerminationReason::Shutdown);
    tracing::debug!(%session_id, "session actor stopped");
}

fn handle<R: GameRules>(session: &mut GameSession<R>, cmd: SessionCommand<R>) {
    match cmd {
        SessionCommand::Join {
            name,
            join_code,
            observer,
            connection,
            reply,
        } => {
            let result = session.join(name, join_code.as_deref(), observer, connection);
            let _ = reply.send(result);
        }
        SessionCommand::Rejoin {
            rejoin_code,
            observer,
            connection,
            reply,
        } => {
            let result = session.rejoin(&rejoin_code, observer, connection);
            let _ = reply.send(result);
        }
        SessionCommand::Disconnect {
            participant_id,
            connection,
            reply,
        } => {
            let _ = reply.send(session.disconnect(participant_id, connection));
        }
        SessionCommand::SubmitMove {
            participant_id,
            mv,
            reply,
        } => {
            let _ = reply.send(session.submit_move(participant_id, mv));
        }
        SessionCommand::GatherMoves { cell, reply } => {
            let _ = reply.send(session.gather_moves(cell));
        }
        SessionCommand::Chat {
            participant_id,
            message,
            reply,
        } => {
            let _ = reply.send(session.chat(participant_id, message));
        }
        SessionCommand::ProposeRematch {
            participant_id,
            reply,
        } => {
            let _ = reply.send(session.propose_rematch(participant_id));
        }
        SessionCommand::AnnounceRematch { session_id, codes } => {
            session.announce_rematch(session_id, &codes);
        }
        SessionCommand::Terminate { reason, reply } => {
            let _ = reply.send(session.terminate(reason));
        }
        SessionCommand::Summary { reply } => {
            let _ = reply.send(session.summary());
        }
        SessionCommand::Snapshot { reply } => {
            let _ = reply.send(session.snapshot());
        }
    }
}

/// Spawns a session actor and returns a handle to it.
///
/// `changes` is where state-change summaries are published; pass a
/// fresh `broadcast::channel` sender for a standalone session.
pub fn spawn_session<R: GameRules>(
    session_id: SessionId,
    config: SessionConfig,
    deck: R::Deck,
    origin: SessionOrigin,
    changes: broadcast::Sender<SessionSummary>,
) -> SessionHandle<R> {
    let config = config.validated();
    let (tx, rx) = mpsc::channel(config.channel_size);
    let session = GameSession::<R>::new(session_id, &config, deck, origin, changes.clone());

    tokio::spawn(run(session, rx));

    SessionHandle {
        session_id,
        sender: tx,
        changes,
    }
}
