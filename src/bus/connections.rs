//! Subscriber registry

use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use uuid::Uuid;

/// An encoded frame queued for one subscriber
#[derive(Debug, Clone)]
pub struct OutboundMessage {
    /// Event name, e.g. `note_created`
    pub event: &'static str,
    /// Serialized frame, shared between all recipients
    pub payload: Arc<str>,
}

/// A live subscriber
pub struct Subscriber {
    pub id: Uuid,
    tx: mpsc::Sender<OutboundMessage>,
}

impl Subscriber {
    pub fn new(tx: mpsc::Sender<OutboundMessage>) -> Self {
        Self {
            id: Uuid::new_v4(),
            tx,
        }
    }

    /// Queue a message without waiting; fails if the buffer is full or the receiver is gone
    pub fn try_send(
        &self,
        msg: OutboundMessage,
    ) -> Result<(), mpsc::error::TrySendError<OutboundMessage>> {
        self.tx.try_send(msg)
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Manages all active subscribers
#[derive(Clone, Default)]
pub struct ConnectionManager {
    connections: Arc<DashMap<Uuid, Arc<Subscriber>>>,
}

impl ConnectionManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, conn: Arc<Subscriber>) {
        self.connections.insert(conn.id, conn);
    }

    /// Remove a subscriber; returns false if it was already gone
    pub fn remove(&self, id: Uuid) -> bool {
        self.connections.remove(&id).is_some()
    }

    /// Snapshot of every subscriber, taken without holding shard locks during delivery
    pub fn all(&self) -> Vec<Arc<Subscriber>> {
        self.connections
            .iter()
            .map(|entry| entry.value().clone())
            .collect()
    }

    pub fn count(&self) -> usize {
        self.connections.len()
    }
}
