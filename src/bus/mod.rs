//! Notification bus
//!
//! Global, unscoped fan-out of note lifecycle events: every subscriber sees every
//! event regardless of who owns the note. Delivery is best-effort; a subscriber
//! whose queue is full or closed misses the event and nothing is replayed.

mod connections;
pub mod messages;

pub use connections::{ConnectionManager, OutboundMessage, Subscriber};
pub use messages::{ClientMessage, ServerMessage};

use crate::storage::Note;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::debug;
use uuid::Uuid;

pub const DEFAULT_SUBSCRIBER_BUFFER: usize = 100;

/// Kind of note mutation being announced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NoteEventKind {
    Created,
    Updated,
    Deleted,
}

impl NoteEventKind {
    /// Event name on the wire
    pub fn event_name(self) -> &'static str {
        match self {
            Self::Created => "note_created",
            Self::Updated => "note_updated",
            Self::Deleted => "note_deleted",
        }
    }

    fn frame(self, note: Note) -> ServerMessage {
        match self {
            Self::Created => ServerMessage::NoteCreated(note),
            Self::Updated => ServerMessage::NoteUpdated(note),
            Self::Deleted => ServerMessage::NoteDeleted(note),
        }
    }
}

/// Handle for one subscriber. Dropping it unsubscribes.
pub struct Subscription {
    id: Uuid,
    rx: mpsc::Receiver<OutboundMessage>,
    connections: ConnectionManager,
}

impl Subscription {
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Wait for the next event; `None` once unsubscribed
    pub async fn recv(&mut self) -> Option<OutboundMessage> {
        self.rx.recv().await
    }

    pub fn try_recv(&mut self) -> Option<OutboundMessage> {
        self.rx.try_recv().ok()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.connections.remove(self.id);
    }
}

/// Fans note events out to all subscribers
#[derive(Clone)]
pub struct NotificationBus {
    connections: ConnectionManager,
    buffer: usize,
}

impl NotificationBus {
    pub fn new(buffer: usize) -> Self {
        Self {
            connections: ConnectionManager::new(),
            buffer: buffer.max(1),
        }
    }

    pub fn subscribe(&self) -> Subscription {
        let (tx, rx) = mpsc::channel(self.buffer);
        let subscriber = Arc::new(Subscriber::new(tx));
        let id = subscriber.id;
        self.connections.add(subscriber);

        debug!(conn_id = %id, subscriber_count = self.connections.count(), "Subscriber added");

        Subscription {
            id,
            rx,
            connections: self.connections.clone(),
        }
    }

    pub fn unsubscribe(&self, id: Uuid) {
        if self.connections.remove(id) {
            debug!(conn_id = %id, "Subscriber removed");
        }
    }

    /// Deliver an event to every current subscriber without waiting on any of them.
    ///
    /// Returns how many subscribers accepted the event.
    pub fn publish(&self, kind: NoteEventKind, note: &Note) -> Result<usize, serde_json::Error> {
        let payload = serde_json::to_string(&kind.frame(note.clone()))?;
        let msg = OutboundMessage {
            event: kind.event_name(),
            payload: Arc::from(payload),
        };

        let subscribers = self.connections.all();
        let mut delivered = 0;

        for subscriber in &subscribers {
            match subscriber.try_send(msg.clone()) {
                Ok(()) => delivered += 1,
                Err(e) => {
                    debug!(
                        conn_id = %subscriber.id,
                        error = %e,
                        "Failed to deliver event (buffer full or disconnected)"
                    );
                    if subscriber.is_closed() {
                        self.connections.remove(subscriber.id);
                    }
                }
            }
        }

        debug!(
            event = kind.event_name(),
            note_id = note.id,
            subscriber_count = subscribers.len(),
            delivered,
            "Published note event"
        );

        Ok(delivered)
    }

    pub fn subscriber_count(&self) -> usize {
        self.connections.count()
    }
}

impl Default for NotificationBus {
    fn default() -> Self {
        Self::new(DEFAULT_SUBSCRIBER_BUFFER)
    }
}
