//! Per-connection handler: request routing and event relay.
//!
//! Each accepted connection gets its own Tokio task running this handler.
//! The flow is:
//!   1. Loop: receive an `Envelope<ClientRequest>` → dispatch it
//!   2. On `Join`/`Rejoin`: reply `Joined`, then spawn a writer task that
//!      relays the session's events to the socket
//!   3. On close, error or idle timeout: disconnect from the session so
//!      the participant is parked for a later rejoin

use std::sync::Arc;
use std::time::Instant;

use duelhall_protocol::{
    ClientRequest, Codec, Envelope, ErrorKind, JsonCodec, ParticipantId, Reply, ServerMessage,
};
use duelhall_session::{GameRules, JoinTicket, Outbound, SessionError, SessionHandle};
use duelhall_transport::{Connection, ConnectionId, WebSocketConnection};
use tokio::sync::{Mutex, mpsc};

use crate::DuelhallError;
use crate::server::ServerState;

/// The sending half of a connection, shared by the request loop and the
/// event writer.
struct Peer {
    conn: WebSocketConnection,
    codec: JsonCodec,
    /// Held across the send, so frames leave in `seq` order.
    seq: Mutex<u64>,
    start: Instant,
}

impl Peer {
    fn new(conn: WebSocketConnection, codec: JsonCodec) -> Self {
        Self {
            conn,
            codec,
            seq: Mutex::new(0),
            start: Instant::now(),
        }
    }

    fn id(&self) -> ConnectionId {
        self.conn.id()
    }

    fn elapsed_ms(&self) -> u64 {
        self.start.elapsed().as_millis() as u64
    }

    async fn send(&self, message: impl Into<ServerMessage>) -> Result<(), DuelhallError> {
        let mut seq = self.seq.lock().await;
        *seq += 1;
        let envelope = Envelope::new(*seq, self.elapsed_ms(), message.into());
        let bytes = self.codec.encode(&envelope)?;
        self.conn.send(&bytes).await?;
        Ok(())
    }
}

/// The session this connection is attached to.
///
/// Dropping a seat that was not explicitly left disconnects the
/// participant. `Drop` is synchronous, so it spawns a fire-and-forget
/// task for the actor round-trip.
struct Seat<R: GameRules> {
    handle: SessionHandle<R>,
    participant_id: ParticipantId,
    connection: ConnectionId,
    attached: bool,
}

impl<R: GameRules> Seat<R> {
    fn new(handle: SessionHandle<R>, participant_id: ParticipantId, connection: ConnectionId) -> Self {
        Self {
            handle,
            participant_id,
            connection,
            attached: true,
        }
    }

    /// Disconnects and waits for the session to acknowledge it.
    async fn leave(mut self) {
        self.attached = false;
        if let Err(e) = self
            .handle
            .disconnect(self.participant_id, self.connection)
            .await
        {
            tracing::debug!(participant_id = %self.participant_id, error = %e, "leave failed");
        }
    }
}

impl<R: GameRules> Drop for Seat<R> {
    fn drop(&mut self) {
        if !self.attached {
            return;
        }
        let handle = self.handle.clone();
        let participant_id = self.participant_id;
        let connection = self.connection;
        tokio::spawn(async move {
            let _ = handle.disconnect(participant_id, connection).await;
        });
    }
}

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection<R: GameRules>(
    conn: WebSocketConnection,
    state: Arc<ServerState<R>>,
) -> Result<(), DuelhallError> {
    let connection = conn.id();
    tracing::debug!(%connection, peer = %conn.peer_addr(), "handling new connection");

    let peer = Arc::new(Peer::new(conn, state.codec));
    let mut seat: Option<Seat<R>> = None;

    loop {
        let data = match tokio::time::timeout(state.idle_timeout, peer.conn.recv()).await {
            Ok(Ok(Some(data))) => data,
            Ok(Ok(None)) => {
                tracing::info!(%connection, "connection closed cleanly");
                break;
            }
            Ok(Err(e)) => {
                tracing::debug!(%connection, error = %e, "recv error");
                break;
            }
            Err(_) => {
                tracing::info!(%connection, "connection idle, dropping it");
                break;
            }
        };

        let envelope: Envelope<ClientRequest> = match state.codec.decode(&data) {
            Ok(envelope) => envelope,
            Err(e) => {
                tracing::debug!(%connection, error = %e, "failed to decode request");
                peer.send(Reply::Error {
                    kind: ErrorKind::BadRequest,
                    message: format!("invalid request: {e}"),
                })
                .await?;
                continue;
            }
        };

        match dispatch(&peer, &state, &mut seat, envelope.payload).await {
            Ok(Some(reply)) => peer.send(reply).await?,
            Ok(None) => {}
            Err(DuelhallError::Session(e)) => {
                tracing::debug!(%connection, kind = %e.kind(), error = %e, "request rejected");
                peer.send(Reply::Error {
                    kind: e.kind(),
                    message: e.to_string(),
                })
                .await?;
            }
            Err(e) => return Err(e),
        }
    }

    if let Some(seat) = seat.take() {
        seat.leave().await;
    }
    Ok(())
}

/// Handles one request. Returns the reply to send, if any.
///
/// Session errors come back as `DuelhallError::Session` and are turned
/// into an error reply by the caller; anything else ends the connection.
async fn dispatch<R: GameRules>(
    peer: &Arc<Peer>,
    state: &ServerState<R>,
    seat: &mut Option<Seat<R>>,
    request: ClientRequest,
) -> Result<Option<Reply>, DuelhallError> {
    match request {
        ClientRequest::Heartbeat { client_time } => Ok(Some(Reply::HeartbeatAck {
            client_time,
            server_time: peer.elapsed_ms(),
        })),

        ClientRequest::CreateSession { name } => {
            state.sessions.prune_terminated().await;
            let session_id = state.sessions.create(name).await.session_id();
            Ok(Some(Reply::SessionCreated { session_id }))
        }

        ClientRequest::ListSessions => {
            state.sessions.prune_terminated().await;
            Ok(Some(Reply::SessionList {
                sessions: state.sessions.list().await,
            }))
        }

        ClientRequest::Join {
            session_id,
            name,
            join_code,
        } => {
            ensure_unseated(seat)?;
            let handle = state.sessions.get(session_id).await?;
            let (observer, events) = mpsc::unbounded_channel();
            let ticket = handle
                .join(name, join_code, Box::new(observer), peer.id())
                .await?;
            take_seat(peer, seat, handle, ticket, events).await?;
            Ok(None)
        }

        ClientRequest::Rejoin {
            session_id,
            rejoin_code,
        } => {
            ensure_unseated(seat)?;
            let handle = state.sessions.get(session_id).await?;
            let (observer, events) = mpsc::unbounded_channel();
            let ticket = handle
                .rejoin(rejoin_code, Box::new(observer), peer.id())
                .await?;
            take_seat(peer, seat, handle, ticket, events).await?;
            Ok(None)
        }

        ClientRequest::SubmitMove { mv } => {
            let seat = seated(seat)?;
            seat.handle.submit_move(seat.participant_id, mv).await?;
            Ok(None)
        }

        ClientRequest::GatherMoves { cell } => {
            let seat = seated(seat)?;
            let options = seat.handle.gather_moves(cell).await?;
            Ok(Some(Reply::MoveOptions { cell, options }))
        }

        ClientRequest::Chat { message } => {
            let seat = seated(seat)?;
            seat.handle.chat(seat.participant_id, message).await?;
            Ok(None)
        }

        ClientRequest::ProposeRematch => {
            let seat = seated(seat)?;
            let session_id = seat.handle.session_id();
            state
                .sessions
                .propose_rematch(session_id, seat.participant_id)
                .await?;
            Ok(None)
        }

        ClientRequest::Leave => {
            if let Some(seat) = seat.take() {
                tracing::info!(
                    connection = %peer.id(),
                    session_id = %seat.handle.session_id(),
                    "client left session"
                );
                seat.leave().await;
            }
            Ok(None)
        }
    }
}

/// Replies `Joined`, records the seat, and starts relaying events.
///
/// The reply goes out before the writer starts, so anything the session
/// queued during the join (e.g. `gameStarted`) follows it on the wire.
async fn take_seat<R: GameRules>(
    peer: &Arc<Peer>,
    seat: &mut Option<Seat<R>>,
    handle: SessionHandle<R>,
    ticket: JoinTicket,
    events: mpsc::UnboundedReceiver<Outbound>,
) -> Result<(), DuelhallError> {
    *seat = Some(Seat::new(handle, ticket.participant_id, peer.id()));
    peer.send(Reply::Joined {
        session_id: ticket.session_id,
        participant_id: ticket.participant_id,
        color: ticket.role,
        name: ticket.name,
        rejoin_code: ticket.rejoin_code,
        board: ticket.board,
    })
    .await?;
    tokio::spawn(relay_events(Arc::clone(peer), events));
    Ok(())
}

/// Writes session events to the socket until the session lets go of the
/// observer or asks for the connection to be closed.
async fn relay_events(peer: Arc<Peer>, mut events: mpsc::UnboundedReceiver<Outbound>) {
    while let Some(outbound) = events.recv().await {
        match outbound {
            Outbound::Event(event) => {
                if let Err(e) = peer.send(event).await {
                    tracing::debug!(connection = %peer.id(), error = %e, "event relay stopped");
                    return;
                }
            }
            Outbound::Close => {
                tracing::debug!(connection = %peer.id(), "session closed the connection");
                let _ = peer.conn.close().await;
                return;
            }
        }
    }
}

fn ensure_unseated<R: GameRules>(seat: &Option<Seat<R>>) -> Result<(), SessionError> {
    match seat {
        Some(_) => Err(SessionError::Misuse(
            "Already in a session; leave it first".into(),
        )),
        None => Ok(()),
    }
}

fn seated<R: GameRules>(seat: &Option<Seat<R>>) -> Result<&Seat<R>, SessionError> {
    seat.as_ref()
        .ok_or_else(|| SessionError::Misuse("Join a session first".into()))
}
