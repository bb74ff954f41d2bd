//! The broadcast bus: the attached participants and fan-out to them.
//!
//! The bus owns the session's active list. Every event the session
//! produces goes through [`BroadcastBus::dispatch`], which picks the
//! observers and swallows per-observer failures so one dead connection
//! never blocks the rest.

use duelhall_protocol::{ParticipantId, Role, SessionEvent};

use crate::participant::{Attached, Participant};

/// Who should receive an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recipient {
    /// Every attached participant.
    All,
    /// One participant only.
    Participant(ParticipantId),
    /// Everyone except the originator.
    AllExcept(ParticipantId),
}

#[derive(Default)]
pub(crate) struct BroadcastBus {
    members: Vec<Attached>,
}

impl BroadcastBus {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn attach(&mut self, member: Attached) {
        self.members.push(member);
    }

    /// Removes a member, keeping the join order of the rest.
    pub(crate) fn detach(&mut self, id: ParticipantId) -> Option<Attached> {
        let index = self
            .members
            .iter()
            .position(|m| m.participant.id == id)?;
        Some(self.members.remove(index))
    }

    pub(crate) fn get(&self, id: ParticipantId) -> Option<&Attached> {
        self.members.iter().find(|m| m.participant.id == id)
    }

    pub(crate) fn get_mut(&mut self, id: ParticipantId) -> Option<&mut Attached> {
        self.members.iter_mut().find(|m| m.participant.id == id)
    }

    /// The attached holder of `role`, if any. Only meaningful for the
    /// primary roles.
    pub(crate) fn holder(&self, role: Role) -> Option<&Participant> {
        self.members
            .iter()
            .map(|m| &m.participant)
            .find(|p| p.role == role)
    }

    pub(crate) fn participants(&self) -> impl Iterator<Item = &Participant> {
        self.members.iter().map(|m| &m.participant)
    }

    pub(crate) fn len(&self) -> usize {
        self.members.len()
    }

    pub(crate) fn publish(&self, event: &SessionEvent) {
        self.dispatch(Recipient::All, event);
    }

    pub(crate) fn broadcast(&self, except: ParticipantId, event: &SessionEvent) {
        self.dispatch(Recipient::AllExcept(except), event);
    }

    pub(crate) fn send(&self, to: ParticipantId, event: &SessionEvent) {
        self.dispatch(Recipient::Participant(to), event);
    }

    pub(crate) fn dispatch(&self, recipient: Recipient, event: &SessionEvent) {
        let targets = self.members.iter().filter(|m| match recipient {
            Recipient::All => true,
            Recipient::Participant(id) => m.participant.id == id,
            Recipient::AllExcept(id) => m.participant.id != id,
        });
        for member in targets {
            if let Err(e) = member.observer.emit(event) {
                tracing::debug!(
                    participant_id = %member.participant.id,
                    event = event.name(),
                    error = %e,
                    "event delivery failed"
                );
            }
        }
    }

    /// Asks every attached transport to close.
    pub(crate) fn close_all(&self) {
        for member in &self.members {
            member.observer.close();
        }
    }
}
