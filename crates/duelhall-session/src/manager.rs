//! Session manager: creates, tracks, and prunes session actors.

use std::collections::HashMap;

use duelhall_identity::JoinCodes;
use duelhall_protocol::{ParticipantId, SessionId, SessionSummary, TerminationReason};
use tokio::sync::{Mutex, broadcast};

use crate::actor::spawn_session;
use crate::{GameRules, RematchVote, SessionConfig, SessionError, SessionHandle, SessionOrigin};

/// Capacity of the shared state-change channel. Slow lobby subscribers
/// that fall further behind than this see a `Lagged` error and skip ahead.
const CHANGES_CAPACITY: usize = 256;

/// The process-wide registry of sessions.
///
/// This is the entry point for session operations from the server and is
/// shared between connection tasks as-is. The map lock is only held to
/// look up, insert or remove handles; every actor round-trip runs on a
/// snapshot taken outside it. Every session it spawns publishes its
/// summaries on one shared channel, so a lobby can
/// [`subscribe`](Self::subscribe) once.
pub struct SessionManager<R: GameRules> {
    sessions: Mutex<HashMap<SessionId, SessionHandle<R>>>,
    config: SessionConfig,
    changes: broadcast::Sender<SessionSummary>,
}

impl<R: GameRules> SessionManager<R> {
    /// Creates an empty registry. `config` applies to every session it
    /// spawns; a per-session name overrides `config.name`.
    pub fn new(config: SessionConfig) -> Self {
        let (changes, _) = broadcast::channel(CHANGES_CAPACITY);
        Self {
            sessions: Mutex::new(HashMap::new()),
            config: config.validated(),
            changes,
        }
    }

    /// Creates an open session dealt the default deck.
    pub async fn create(&self, name: Option<String>) -> SessionHandle<R> {
        self.create_with_deck(name, R::Deck::default()).await
    }

    /// Creates an open session with a specific deck.
    pub async fn create_with_deck(&self, name: Option<String>, deck: R::Deck) -> SessionHandle<R> {
        let mut config = self.config.clone();
        if name.is_some() {
            config.name = name;
        }
        self.spawn(config, deck, SessionOrigin::Fresh).await
    }

    /// Creates the follow-up to `prior`, with two fresh join codes that
    /// reserve White and Black.
    pub async fn create_rematch(&self, prior: SessionId, deck: R::Deck) -> (SessionHandle<R>, JoinCodes) {
        let codes = JoinCodes::generate();
        let origin = SessionOrigin::Rematch {
            prior,
            codes: codes.clone(),
        };
        let handle = self.spawn(self.config.clone(), deck, origin).await;
        (handle, codes)
    }

    async fn spawn(&self, config: SessionConfig, deck: R::Deck, origin: SessionOrigin) -> SessionHandle<R> {
        let session_id = SessionId::new();
        let handle = spawn_session::<R>(session_id, config, deck, origin, self.changes.clone());
        let mut sessions = self.sessions.lock().await;
        sessions.insert(session_id, handle.clone());
        tracing::debug!(%session_id, sessions = sessions.len(), "session registered");
        handle
    }

    /// Looks up a session.
    ///
    /// # Errors
    /// [`SessionError::NotFound`] if no such session is registered.
    pub async fn get(&self, session_id: SessionId) -> Result<SessionHandle<R>, SessionError> {
        self.sessions
            .lock()
            .await
            .get(&session_id)
            .cloned()
            .ok_or(SessionError::NotFound(session_id))
    }

    /// Handles of every registered session, copied out under the lock.
    async fn handles(&self) -> Vec<SessionHandle<R>> {
        self.sessions.lock().await.values().cloned().collect()
    }

    /// Records a rematch vote and, once both players agree, creates the
    /// rematch session and hands out its join codes.
    ///
    /// Returns the new session's id when this vote completed the
    /// agreement.
    pub async fn propose_rematch(
        &self,
        session_id: SessionId,
        participant_id: ParticipantId,
    ) -> Result<Option<SessionId>, SessionError> {
        let handle = self.get(session_id).await?;
        match handle.propose_rematch(participant_id).await? {
            RematchVote::Pending => Ok(None),
            RematchVote::Agreed { deck } => {
                let (rematch, codes) = self.create_rematch(session_id, deck).await;
                let rematch_id = rematch.session_id();
                handle.announce_rematch(rematch_id, codes).await?;
                tracing::info!(%session_id, %rematch_id, "rematch created");
                Ok(Some(rematch_id))
            }
        }
    }

    /// Summaries of every registered session.
    ///
    /// Sessions that fail to respond (actor gone) are silently skipped.
    pub async fn list(&self) -> Vec<SessionSummary> {
        let handles = self.handles().await;
        let mut summaries = Vec::with_capacity(handles.len());
        for handle in &handles {
            if let Ok(summary) = handle.summary().await {
                summaries.push(summary);
            }
        }
        summaries
    }

    /// Drops terminated (or unresponsive) sessions from the registry and
    /// returns their ids.
    ///
    /// Handles still held elsewhere keep their actor alive until they are
    /// dropped too.
    pub async fn prune_terminated(&self) -> Vec<SessionId> {
        let mut dead = Vec::new();
        for handle in self.handles().await {
            let terminated = match handle.summary().await {
                Ok(summary) => summary.state.is_terminated(),
                Err(_) => true,
            };
            if terminated {
                dead.push(handle.session_id());
            }
        }
        if dead.is_empty() {
            return dead;
        }
        let mut sessions = self.sessions.lock().await;
        for id in &dead {
            sessions.remove(id);
        }
        tracing::info!(pruned = dead.len(), remaining = sessions.len(), "pruned sessions");
        dead
    }

    /// Terminates every session, e.g. on server shutdown.
    pub async fn terminate_all(&self, reason: TerminationReason) {
        for handle in self.handles().await {
            if let Err(e) = handle.terminate(reason).await {
                tracing::debug!(session_id = %handle.session_id(), error = %e, "terminate failed");
            }
        }
    }

    /// A receiver for summaries from every session in the registry.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionSummary> {
        self.changes.subscribe()
    }
}
