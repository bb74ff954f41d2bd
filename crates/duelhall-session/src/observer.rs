//! Observers: where a participant's session events are delivered.
//!
//! The session does not know about sockets. Each attached participant
//! comes with an [`Observer`], and the session only ever calls `emit` and
//! `close` on it. The server's per-connection writer task sits on the
//! other end of an [`ObserverSender`].

use duelhall_protocol::SessionEvent;
use tokio::sync::mpsc;

/// Delivery to one observer failed; its receiving end is gone.
#[derive(Debug, thiserror::Error)]
#[error("observer is no longer receiving")]
pub struct DeliveryError;

/// Receives events for one attached participant.
///
/// Both methods must return quickly: they run on the session actor, and
/// a slow observer would hold up every other participant.
pub trait Observer: Send + Sync + 'static {
    /// Queues one event for delivery.
    ///
    /// # Errors
    /// Returns [`DeliveryError`] if the observer can no longer receive.
    /// The session logs it and carries on.
    fn emit(&self, event: &SessionEvent) -> Result<(), DeliveryError>;

    /// Asks the underlying transport to close.
    fn close(&self);
}

/// What flows from the session to a connection's writer task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outbound {
    Event(SessionEvent),
    /// Close the connection after flushing everything queued before it.
    Close,
}

/// The standard observer: an unbounded channel into a writer task.
///
/// Unbounded so `emit` never waits; per-observer order is the order the
/// session emitted in.
pub type ObserverSender = mpsc::UnboundedSender<Outbound>;

impl Observer for ObserverSender {
    fn emit(&self, event: &SessionEvent) -> Result<(), DeliveryError> {
        self.send(Outbound::Event(event.clone()))
            .map_err(|_| DeliveryError)
    }

    fn close(&self) {
        let _ = self.send(Outbound::Close);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_emit_queues_event_in_order() {
        let (tx, mut rx) = mpsc::unbounded_channel();

        tx.emit(&SessionEvent::GameStarted {}).unwrap();
        tx.close();

        assert_eq!(
            rx.try_recv().unwrap(),
            Outbound::Event(SessionEvent::GameStarted {})
        );
        assert_eq!(rx.try_recv().unwrap(), Outbound::Close);
    }

    #[test]
    fn test_emit_after_receiver_dropped_returns_error() {
        let (tx, rx) = mpsc::unbounded_channel::<Outbound>();
        drop(rx);

        assert!(tx.emit(&SessionEvent::GameStarted {}).is_err());
        // close on a dead channel is silently ignored
        tx.close();
    }
}
