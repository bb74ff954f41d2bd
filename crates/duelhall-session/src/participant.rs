//! Participant records.

use duelhall_protocol::{ParticipantId, Role};
use duelhall_transport::ConnectionId;

use crate::Observer;

/// One person in a session, attached or not.
///
/// While attached, a participant is wrapped in an [`Attached`] on the
/// broadcast bus. While disconnected, the bare record sits in the
/// reconnection ledger. It is moved between the two, never copied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Participant {
    pub id: ParticipantId,
    pub name: String,
    pub role: Role,
    /// Private; only the participant's own client ever sees it.
    pub rejoin_code: String,
    pub rematch_accepted: bool,
}

/// A participant bound to a live transport.
pub(crate) struct Attached {
    pub(crate) participant: Participant,
    pub(crate) observer: Box<dyn Observer>,
    /// The connection that attached this participant. Disconnect
    /// notifications from any other connection are ignored.
    pub(crate) connection: ConnectionId,
}
